use proptest::prelude::*;
use repo_store::{NormalizedPath, PropertyValue, parse_properties};

proptest! {
    #[test]
    fn test_normalization_invariants(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        let as_str = path.as_str();

        // Always absolute, forward slashes only
        prop_assert!(as_str.starts_with('/'));
        prop_assert!(!as_str.contains('\\'));

        // No empty segments
        prop_assert!(!as_str.contains("//"));

        // Only the root ends with a separator
        prop_assert!(path.is_root() || !as_str.ends_with('/'));

        // Normalizing twice is a no-op
        let again = NormalizedPath::new(as_str);
        prop_assert_eq!(&again, &path);
    }

    #[test]
    fn test_join_then_parent(base in "[a-z]{1,8}(/[a-z]{1,8}){0,3}", leaf in "[a-z.]{1,12}") {
        let base = NormalizedPath::new(&base);
        prop_assume!(!leaf.chars().all(|c| c == '.'));
        let joined = base.join(&leaf);

        prop_assert!(joined.starts_with(&base));
        prop_assert_eq!(joined.parent(), Some(base.clone()));
        prop_assert_eq!(joined.depth(), base.depth() + 1);
    }

    #[test]
    fn test_properties_parser_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = parse_properties(&bytes);
    }

    #[test]
    fn test_properties_separators_are_interchangeable(
        key in "[a-z][a-z0-9.]{0,10}",
        value in "[a-z0-9,/][a-z0-9 ,/]{0,20}",
        sep in prop::sample::select(vec!["=", ":", " ", " = ", "\t: "])
    ) {
        let text = format!("{key}{sep}{value}\n");
        let props = parse_properties(text.as_bytes()).unwrap();
        prop_assert_eq!(props.get(&key), Some(&PropertyValue::from(value.as_str())));
    }

    #[test]
    fn test_properties_continuation_joins_value(
        parts in proptest::collection::vec("[a-z0-9]{1,6}", 1..5),
        indent in "[ \t]{0,4}"
    ) {
        let continued = parts.join(&format!(",\\\n{indent}"));
        let text = format!("list = {continued}\n");
        let props = parse_properties(text.as_bytes()).unwrap();
        prop_assert_eq!(props.get("list"), Some(&PropertyValue::from(parts.join(",").as_str())));
    }
}
