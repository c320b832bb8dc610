//! The table of known entity classes.
//!
//! Records are only ever instantiated through [`ClassRegistry`], an explicit
//! name-to-factory mapping built at startup. There is no dynamic lookup by
//! type name anywhere else.

use crate::model::{AttrKind, Record};

/// Class-specific attributes seeded on creation, beyond the base
/// `id` / `created_at` / `updated_at` trio every record carries.
const CLASSES: &[(&str, &[(&str, AttrKind)])] = &[
    ("Amenity", &[("name", AttrKind::Str)]),
    ("BaseModel", &[]),
    ("City", &[("state_id", AttrKind::Str), ("name", AttrKind::Str)]),
    (
        "Place",
        &[
            ("city_id", AttrKind::Str),
            ("user_id", AttrKind::Str),
            ("name", AttrKind::Str),
            ("description", AttrKind::Str),
            ("number_rooms", AttrKind::Int),
            ("number_bathrooms", AttrKind::Int),
            ("max_guest", AttrKind::Int),
            ("price_by_night", AttrKind::Int),
            ("latitude", AttrKind::Float),
            ("longitude", AttrKind::Float),
        ],
    ),
    (
        "Review",
        &[
            ("place_id", AttrKind::Str),
            ("user_id", AttrKind::Str),
            ("text", AttrKind::Str),
        ],
    ),
    ("State", &[("name", AttrKind::Str)]),
    (
        "User",
        &[
            ("email", AttrKind::Str),
            ("password", AttrKind::Str),
            ("first_name", AttrKind::Str),
            ("last_name", AttrKind::Str),
        ],
    ),
];

/// Mapping from class-name string to a record factory.
pub struct ClassRegistry {
    classes: Vec<(&'static str, &'static [(&'static str, AttrKind)])>,
}

impl ClassRegistry {
    /// Build the registry with every known class.
    pub fn new() -> Self {
        Self {
            classes: CLASSES.to_vec(),
        }
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.classes.iter().any(|(class, _)| *class == name)
    }

    /// Names of all known classes, in registry order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.classes.iter().map(|(class, _)| *class)
    }

    /// Create a fresh record of `name` with its class defaults, or `None`
    /// for an unknown class.
    pub fn instantiate(&self, name: &str) -> Option<Record> {
        let (class, defaults) = self.classes.iter().find(|(class, _)| *class == name)?;
        let mut record = Record::new(*class);
        for (attr, kind) in *defaults {
            record.set(*attr, kind.default_value());
        }
        Some(record)
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ClassRegistry;
    use crate::model::AttrValue;

    #[test]
    fn test_registry_knows_all_console_classes() {
        let registry = ClassRegistry::new();
        for class in [
            "BaseModel", "User", "State", "City", "Amenity", "Place", "Review",
        ] {
            assert!(registry.is_known(class), "{class} should be registered");
        }
        assert_eq!(registry.names().count(), 7);
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let registry = ClassRegistry::new();
        assert!(!registry.is_known("MyModel"));
        assert!(registry.instantiate("MyModel").is_none());
    }

    #[test]
    fn test_place_defaults_are_typed() {
        let registry = ClassRegistry::new();
        let place = registry.instantiate("Place").expect("Place is known");
        assert_eq!(place.get("number_rooms"), Some(&AttrValue::Int(0)));
        assert_eq!(place.get("latitude"), Some(&AttrValue::Float(0.0)));
        assert_eq!(
            place.get("description"),
            Some(&AttrValue::Str(String::new()))
        );
    }

    #[test]
    fn test_instantiate_seeds_identity_and_defaults() {
        let registry = ClassRegistry::new();
        let user = registry.instantiate("User").expect("User is known");
        assert_eq!(user.class(), "User");
        assert_eq!(user.id().len(), 36);
        assert_eq!(user.get("email"), Some(&AttrValue::Str(String::new())));
    }
}
