use std::path::PathBuf;

use proptest::prelude::*;
use scaffold_core::{ProjectLayout, ScaffoldConfig};

fn class_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9]{0,12}"
}

proptest! {
    #[test]
    fn entity_classes_map_into_the_source_root(name in class_name(), sub in proptest::option::of(class_name())) {
        let layout = ProjectLayout::new(ScaffoldConfig::default());
        let input = match &sub {
            Some(sub) => format!("{sub}\\{name}"),
            None => name.clone(),
        };
        let fqn = layout.entity_fqn(&input);
        let class = layout.class_ref(&fqn).unwrap();

        let mut expected = PathBuf::from("src/Entity");
        if let Some(sub) = &sub {
            expected.push(sub);
        }
        expected.push(format!("{name}.php"));
        prop_assert_eq!(&class.path, &expected);
        prop_assert!(class.editable);
        prop_assert_eq!(class.short_name(), name.as_str());
    }

    #[test]
    fn absolute_names_ignore_the_entity_namespace(name in class_name()) {
        let layout = ProjectLayout::new(ScaffoldConfig::default());
        let fqn = layout.entity_fqn(&format!("\\App\\Model\\{name}"));
        prop_assert_eq!(fqn, format!("App\\Model\\{name}"));
    }

    #[test]
    fn vendor_classes_are_read_only(name in class_name()) {
        let layout = ProjectLayout::new(
            ScaffoldConfig::default().with_autoload("Some\\Vendor\\", "vendor/some-vendor/src"),
        );
        let class = layout.class_ref(&format!("Some\\Vendor\\{name}")).unwrap();
        prop_assert!(class.path.starts_with("vendor/some-vendor/src"));
        prop_assert!(!class.editable);
    }
}
