use pretty_assertions::assert_eq;
use proptest::prelude::*;
use scaffold_source::{parse, Mutator, MutationOp, ParseMode};

fn member() -> impl Strategy<Value = String> {
    prop_oneof![
        (
            "(private|protected|public)",
            "(\\?int|string|\\?User|array|int\\|null|)",
            prop::option::of("(null|0|'a;b'|\\[1, 2\\])"),
        )
            .prop_map(|(vis, ty, default)| {
                let ty = if ty.is_empty() { String::new() } else { format!("{ty} ") };
                match default {
                    Some(d) => format!("{vis} {ty}$NAME = {d};"),
                    None => format!("{vis} {ty}$NAME;"),
                }
            }),
        prop_oneof![
            Just("{ return 1; }"),
            Just("{\n        $s = \"}\";\n        return strlen($s);\n    }"),
            Just("{}"),
        ]
        .prop_map(|body| format!(
            "public function NAME(int $a = 1, ?string $b = null): ?int\n    {body}"
        )),
        Just("#[ORM\\Column(length: 255)]\n    private ?string $NAME = null;".to_string()),
        Just("/** doc */\n    public const NAME = 'x';".to_string()),
        Just("// note\n    protected static array $NAME = [];".to_string()),
    ]
}

fn class_text() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(member(), 0..8),
        "(\n|\n\n|\n\n\n)",
        prop::bool::ANY,
    )
        .prop_map(|(members, gap, namespaced)| {
            let mut text = String::from("<?php\n\n");
            if namespaced {
                text.push_str("namespace App\\Entity;\n\nuse Doctrine\\ORM\\Mapping as ORM;\n\n");
            }
            text.push_str("#[ORM\\Entity]\nclass Sample\n{\n");
            for (i, m) in members.iter().enumerate() {
                let named = m.replace("NAME", &format!("m{i}"));
                text.push_str("    ");
                text.push_str(&named);
                text.push_str(&gap);
            }
            text.push_str("}\n");
            text
        })
}

proptest! {
    #[test]
    fn unmodified_files_serialize_byte_identical(text in class_text()) {
        let file = parse(&text, "Sample.php", ParseMode::Strict).unwrap();
        prop_assert_eq!(file.serialize(), text);
    }

    #[test]
    fn reparsing_serialized_output_gives_equal_model(text in class_text()) {
        let file = parse(&text, "Sample.php", ParseMode::Strict).unwrap();
        let again = parse(&file.serialize(), "Sample.php", ParseMode::Strict).unwrap();
        prop_assert_eq!(file, again);
    }

    #[test]
    fn empty_plan_changes_nothing(text in class_text()) {
        let mut file = parse(&text, "Sample.php", ParseMode::Strict).unwrap();
        let report = Mutator::new().apply_all(&mut file, Vec::<MutationOp>::new()).unwrap();
        prop_assert!(!report.changed());
        prop_assert_eq!(file.source(), text.as_str());
    }
}

#[test]
fn lenient_and_strict_agree_on_clean_files() {
    let text = "<?php\n\nfinal class A extends B implements C, D\n{\n    use T;\n\n    private int $x = 0;\n\n    abstract protected function f(): void;\n}\n";
    let strict = parse(text, "A.php", ParseMode::Strict).unwrap();
    let lenient = parse(text, "A.php", ParseMode::Lenient).unwrap();
    assert_eq!(strict.properties(), lenient.properties());
    assert_eq!(strict.methods(), lenient.methods());
    assert!(strict.method("f").unwrap().is_abstract);
}

#[test]
fn lenient_keeps_unknown_members_verbatim() {
    let text = "<?php\n\nclass A\n{\n    private int $x;\n\n    garbage here;\n}\n";
    assert!(parse(text, "A.php", ParseMode::Strict).is_err());
    let file = parse(text, "A.php", ParseMode::Lenient).unwrap();
    assert_eq!(file.properties().len(), 1);
    assert_eq!(file.serialize(), text);
}
