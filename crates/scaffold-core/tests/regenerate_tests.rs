use std::path::Path;

use pretty_assertions::assert_eq;
use scaffold_core::{FileStatus, ScaffoldError};
use scaffold_test_utils::fixtures::*;
use scaffold_test_utils::{HarnessConfig, Scenario};

const BROKEN_PATH: &str = "src/Entity/Broken.php";
const BROKEN: &str = "<?php

namespace App\\Entity;

class Broken
{
    public function open()
    {
";

fn harness() -> HarnessConfig {
    HarnessConfig::default()
}

fn many_to_many() -> Scenario {
    Scenario::new("regenerate_many_to_many")
        .with_file(CLIENT_PATH, CLIENT)
        .with_file(TAG_PATH, TAG)
}

#[test]
fn mapped_properties_get_accessors() {
    let outcome = many_to_many().run_regenerate(&harness(), None).unwrap();
    let report = outcome.report();
    assert_eq!(report.count(FileStatus::Updated), 2);

    let client = outcome.read(CLIENT_PATH);
    assert!(client.contains("use Doctrine\\Common\\Collections\\ArrayCollection;"));
    assert!(client.contains(
        "    public function __construct()\n    {\n        $this->tags = new ArrayCollection();\n    }"
    ));
    assert!(client.contains("public function getId(): ?int"));
    assert!(!client.contains("public function setId("));
    assert!(client.contains("public function setName(?string $name): static"));
    assert!(client.contains("public function addTag(Tag $tag): static"));
    assert!(client.contains("        $this->tags->removeElement($tag);\n"));

    let tag = outcome.read(TAG_PATH);
    assert!(tag.contains("$client->addTag($this);"));
    assert!(tag.contains("$client->removeTag($this);"));
}

#[test]
fn regeneration_is_idempotent() {
    let first = many_to_many().run_regenerate(&harness(), None).unwrap();
    let outcome = Scenario::new("regenerate_again")
        .with_file(CLIENT_PATH, first.read(CLIENT_PATH))
        .with_file(TAG_PATH, first.read(TAG_PATH))
        .run_regenerate(&harness(), None)
        .unwrap();
    assert_eq!(outcome.report().count(FileStatus::Unchanged), 2);
    assert_eq!(outcome.read(CLIENT_PATH), first.read(CLIENT_PATH));
}

#[test]
fn unparseable_file_is_skipped_without_overwrite() {
    let outcome = Scenario::new("regenerate_invalid_method")
        .with_file(USER_PATH, USER_INVALID_METHOD)
        .with_file(PHOTO_PATH, user_avatar_photo())
        .run_regenerate(&harness(), None)
        .unwrap();
    let report = outcome.report();

    let user = report.file(Path::new(USER_PATH)).unwrap();
    assert_eq!(user.status, FileStatus::Skipped);
    assert!(user.message.as_deref().unwrap().contains("overwrite"));
    assert_eq!(
        report.file(Path::new(PHOTO_PATH)).unwrap().status,
        FileStatus::Unchanged
    );
    assert!(report.is_success());
    assert_eq!(outcome.read(USER_PATH), USER_INVALID_METHOD);
}

#[test]
fn overwrite_replaces_malformed_method() {
    let outcome = Scenario::new("regenerate_invalid_method_overwrite")
        .with_file(USER_PATH, USER_INVALID_METHOD)
        .with_overwrite()
        .run_regenerate(&harness(), None)
        .unwrap();

    assert_eq!(
        outcome.report().file(Path::new(USER_PATH)).unwrap().status,
        FileStatus::Updated
    );
    assert_eq!(outcome.read(USER_PATH), USER_INVALID_METHOD_REGENERATED);
}

#[test]
fn unbalanced_file_fails_and_batch_continues() {
    let outcome = many_to_many()
        .with_file(BROKEN_PATH, BROKEN)
        .with_overwrite()
        .run_regenerate(&harness(), None)
        .unwrap();
    let report = outcome.report();

    assert_eq!(
        report.file(Path::new(BROKEN_PATH)).unwrap().status,
        FileStatus::Failed
    );
    assert_eq!(report.count(FileStatus::Updated), 2);
    assert!(!report.is_success());
    assert_eq!(outcome.read(BROKEN_PATH), BROKEN);
}

#[test]
fn vendor_namespace_is_never_written() {
    let outcome = Scenario::new("regenerate_vendor")
        .with_config(vendor_config())
        .with_file(VENDOR_GROUP_PATH, VENDOR_GROUP)
        .run_regenerate(&harness(), Some("Some\\Vendor"))
        .unwrap();
    let report = outcome.report();

    assert_eq!(report.count(FileStatus::Skipped), 1);
    assert_eq!(outcome.read(VENDOR_GROUP_PATH), VENDOR_GROUP);
}

#[test]
fn unmapped_namespace_is_an_error() {
    let outcome = many_to_many()
        .run_regenerate(&harness(), Some("Acme\\Model"))
        .unwrap();
    assert!(matches!(outcome.result, Err(ScaffoldError::InvalidInput(_))));
}

#[test]
fn report_serializes_to_json() {
    let outcome = many_to_many()
        .with_file(BROKEN_PATH, BROKEN)
        .run_regenerate(&HarnessConfig::on_disk(), None)
        .unwrap();
    let json = serde_json::to_value(outcome.report()).unwrap();
    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0]["path"], "src/Entity/Broken.php");
    assert_eq!(files[0]["status"], "skipped");
    assert!(files[0]["message"].is_string());
    assert_eq!(files[1]["status"], "updated");
}
