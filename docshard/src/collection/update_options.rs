/// Options for the update operation.
///
/// The defaults reproduce the single-document semantics of the command
/// surface: only the first matching document is replaced and nothing is
/// inserted when no document matches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Update every matching document instead of only the first.
    pub multi: bool,
    /// Reserved: insert the update document when nothing matches.
    /// Carried but not acted upon yet.
    pub upsert: bool,
}

impl UpdateOptions {
    pub fn new(multi: bool, upsert: bool) -> Self {
        UpdateOptions { multi, upsert }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_single_document() {
        let options = UpdateOptions::default();
        assert!(!options.multi);
        assert!(!options.upsert);
    }
}
