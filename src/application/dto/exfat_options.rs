//! ExFAT walk options DTO

/// Options for an exFAT directory walk (spec section 6's
/// `--include-deleted`).
#[derive(Debug, Clone, Default)]
pub struct ExfatOptions {
    /// Emit entries whose top bit is clear (deleted-but-unwiped records),
    /// and let the cluster-chain follower fall back to the
    /// `NextFreeCluster` heuristic once the FAT runs out for them.
    pub include_deleted: bool,
}

impl ExfatOptions {
    pub fn new(include_deleted: bool) -> Self {
        Self { include_deleted }
    }
}
