/// How a document changed relative to a target's last raised snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentViewChangeType {
    Added,
    Modified,
    Removed,
    /// The document is still part of the target but no field delta is known.
    Metadata,
}

/// Folds a newly observed change into the change already pending for the same
/// document and target. `None` means the two changes cancel out.
///
/// | existing \ incoming | Added    | Modified | Metadata | Removed |
/// |---------------------|----------|----------|----------|---------|
/// | none                | Added    | Modified | Metadata | Removed |
/// | Added               | Added    | Added    | Added    | none    |
/// | Modified            | Modified | Modified | Modified | Removed |
/// | Metadata            | Added    | Modified | Metadata | Removed |
/// | Removed             | Modified | Modified | Modified | Removed |
pub fn fold_change(
    existing: Option<DocumentViewChangeType>,
    incoming: DocumentViewChangeType,
) -> Option<DocumentViewChangeType> {
    use DocumentViewChangeType::*;

    let Some(existing) = existing else {
        return Some(incoming);
    };

    match (existing, incoming) {
        (Added, Removed) => None,
        (Added, _) => Some(Added),
        (Modified, Removed) => Some(Removed),
        (Modified, _) => Some(Modified),
        (Metadata, other) => Some(other),
        (Removed, Removed) => Some(Removed),
        // Removed and re-added before the snapshot was raised: the document was
        // part of the target all along.
        (Removed, _) => Some(Modified),
    }
}
