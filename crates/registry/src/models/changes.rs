use super::{Pack, VersionRange};

/// A partial edit of a pack's display metadata.
///
/// Fields left as `None` keep their current value. `description` is doubly
/// optional so it can be cleared: `Some(None)` removes it. Slug, hash, upload
/// time and the temporary flag are not editable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub minimum: Option<String>,
    pub maximum: Option<String>,
    pub main: Option<bool>,
}
impl PackChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Builds the edited copy of `pack`. Does not validate.
    pub fn apply(self, pack: &Pack) -> Pack {
        let minecraft = VersionRange::new(
            self.minimum.unwrap_or_else(|| pack.minecraft.minimum.clone()),
            self.maximum.unwrap_or_else(|| pack.minecraft.maximum.clone()),
        );
        pack.clone()
            .with_name(self.name.unwrap_or_else(|| pack.name.clone()))
            .with_description(self.description.unwrap_or_else(|| pack.description.clone()))
            .with_minecraft(minecraft)
            .with_main(self.main.unwrap_or(pack.main))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn pack() -> Pack {
        Pack {
            name: "Faithful".to_string(),
            description: Some("The classic look".to_string()),
            slug: "aaaaaaaa".to_string(),
            uploaded: datetime!(2024-06-01 10:00:00 UTC),
            minecraft: VersionRange::new("1.19", "1.20.4"),
            sha1: String::new(),
            main: true,
            is_temporary: false,
        }
    }

    #[test]
    fn test_empty_changes_are_identity() {
        assert!(PackChanges::default().is_empty());
        assert_eq!(PackChanges::default().apply(&pack()), pack());
    }

    #[test]
    fn test_apply() {
        let changes = PackChanges {
            name: Some("Faithful 32x".to_string()),
            description: Some(None),
            maximum: Some("1.21".to_string()),
            main: Some(false),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        let edited = changes.apply(&pack());
        assert_eq!(edited.name, "Faithful 32x");
        assert_eq!(edited.description, None);
        assert_eq!(edited.minecraft, VersionRange::new("1.19", "1.21"));
        assert!(!edited.main);
        assert_eq!(edited.slug, "aaaaaaaa");
        assert_eq!(edited.uploaded, pack().uploaded);
    }
}
