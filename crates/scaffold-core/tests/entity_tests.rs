use std::path::Path;

use pretty_assertions::assert_eq;
use scaffold_core::{
    AnswerQueue, Answer, EntityMaker, EntitySkeleton, Filesystem, ProjectLayout, PromptKey,
    ScaffoldConfig, ScaffoldError,
};
use scaffold_relation::{AttributeTagRenderer, Cardinality};
use scaffold_test_utils::fixtures::{self, *};
use scaffold_test_utils::{HarnessConfig, MemoryFilesystem, Scenario};

const USER_WITH_PHOTOS: &str = "<?php

namespace App\\Entity;

use Doctrine\\Common\\Collections\\ArrayCollection;
use Doctrine\\Common\\Collections\\Collection;
use Doctrine\\ORM\\Mapping as ORM;

#[ORM\\Entity]
class User
{
    #[ORM\\Id]
    #[ORM\\GeneratedValue]
    #[ORM\\Column]
    private ?int $id = null;

    /**
     * @var Collection<int, UserAvatarPhoto>
     */
    #[ORM\\OneToMany(targetEntity: UserAvatarPhoto::class, mappedBy: 'user', orphanRemoval: true)]
    private Collection $photos;

    public function __construct()
    {
        $this->photos = new ArrayCollection();
    }

    public function getId(): ?int
    {
        return $this->id;
    }

    /**
     * @return Collection<int, UserAvatarPhoto>
     */
    public function getPhotos(): Collection
    {
        return $this->photos;
    }

    public function addPhoto(UserAvatarPhoto $photo): static
    {
        if (!$this->photos->contains($photo)) {
            $this->photos->add($photo);
            $photo->setUser($this);
        }

        return $this;
    }

    public function removePhoto(UserAvatarPhoto $photo): static
    {
        if ($this->photos->removeElement($photo)) {
            // set the owning side to null (unless already changed)
            if ($photo->getUser() === $this) {
                $photo->setUser(null);
            }
        }

        return $this;
    }
}
";

const PHOTO_WITH_USER: &str = "<?php

namespace App\\Entity;

use Doctrine\\ORM\\Mapping as ORM;

#[ORM\\Entity]
class UserAvatarPhoto
{
    #[ORM\\Id]
    #[ORM\\GeneratedValue]
    #[ORM\\Column]
    private ?int $id = null;

    #[ORM\\ManyToOne(inversedBy: 'photos')]
    #[ORM\\JoinColumn(nullable: false)]
    private ?User $user = null;

    public function getId(): ?int
    {
        return $this->id;
    }

    public function getUser(): ?User
    {
        return $this->user;
    }

    public function setUser(?User $user): static
    {
        $this->user = $user;

        return $this;
    }
}
";

fn harness() -> HarnessConfig {
    HarnessConfig::default()
}

fn photos_scenario() -> Scenario {
    Scenario::new("one_to_many_photos")
        .with_file(USER_PATH, user())
        .with_file(PHOTO_PATH, user_avatar_photo())
        .text("User")
        .text("photos")
        .text("OneToMany")
        .text("UserAvatarPhoto")
        .enter()
        .no()
        .yes()
        .enter()
}

#[test]
fn one_to_many_updates_both_classes() {
    let outcome = photos_scenario().run_entity(&harness()).unwrap();
    let report = outcome.report();

    assert_eq!(outcome.read(USER_PATH), USER_WITH_PHOTOS);
    assert_eq!(outcome.read(PHOTO_PATH), PHOTO_WITH_USER);
    assert_eq!(
        report.transcript[report.transcript.len() - 2..],
        [
            "updated: src/Entity/User.php".to_string(),
            "updated: src/Entity/UserAvatarPhoto.php".to_string()
        ]
    );
    assert!(outcome
        .questions()
        .contains(&"Is the UserAvatarPhoto.user property allowed to be null (nullable)?"));
    assert_eq!(outcome.unanswered, 0);
}

#[test]
fn one_to_many_on_disk() {
    let outcome = photos_scenario().run_entity(&HarnessConfig::on_disk()).unwrap();
    assert!(outcome.workspace.root().is_some());
    assert_eq!(outcome.read(PHOTO_PATH), PHOTO_WITH_USER);
}

#[test]
fn vendor_target_is_never_edited() {
    let outcome = Scenario::new("vendor_many_to_one")
        .with_config(vendor_config())
        .with_file(USER_PATH, user())
        .with_file(VENDOR_GROUP_PATH, VENDOR_GROUP)
        .text("User")
        .text("group")
        .text("ManyToOne")
        .text("\\Some\\Vendor\\Group")
        .enter()
        .enter()
        .run_entity(&harness())
        .unwrap();
    let report = outcome.report();

    assert!(!outcome.was_asked(PromptKey::GenerateInverse));
    assert!(!outcome.was_asked(PromptKey::InverseField));
    assert_eq!(outcome.read(VENDOR_GROUP_PATH), VENDOR_GROUP);
    assert!(report
        .transcript
        .iter()
        .all(|line| !line.starts_with("updated: vendor/")));
    assert_eq!(report.written.len(), 1);

    let user = outcome.read(USER_PATH);
    assert!(user.contains("use Some\\Vendor\\Group;"));
    assert!(user.contains("    #[ORM\\ManyToOne]\n    private ?Group $group = null;"));
    assert!(!user.contains("inversedBy"));
    assert!(user.contains("public function setGroup(?Group $group): static"));
}

#[test]
fn vendor_target_rejects_one_to_many() {
    let outcome = Scenario::new("vendor_one_to_many")
        .with_config(vendor_config())
        .with_file(USER_PATH, user())
        .with_file(VENDOR_GROUP_PATH, VENDOR_GROUP)
        .text("User")
        .text("groups")
        .text("OneToMany")
        .text("\\Some\\Vendor\\Group")
        .run_entity(&harness())
        .unwrap();

    assert!(matches!(outcome.result, Err(ScaffoldError::Relation(_))));
    assert!(!outcome.was_asked(PromptKey::InverseField));
    assert_eq!(outcome.read(USER_PATH), user());
}

#[test]
fn self_reference_edits_one_file() {
    let outcome = Scenario::new("self_reference")
        .with_file(USER_PATH, user())
        .text("User")
        .text("guardian")
        .text("ManyToOne")
        .text("User")
        .enter()
        .enter()
        .text("dependants")
        .enter()
        .run_entity(&harness())
        .unwrap();
    let report = outcome.report();

    assert_eq!(report.written.len(), 1);
    assert!(outcome
        .questions()
        .contains(&"Is the User.guardian property allowed to be null (nullable)?"));
    assert!(!outcome.was_asked(PromptKey::OrphanRemoval));

    let user = outcome.read(USER_PATH);
    assert!(user.contains("#[ORM\\ManyToOne(inversedBy: 'dependants')]\n    private ?User $guardian = null;"));
    assert!(user.contains("mappedBy: 'guardian'"));
    assert!(user.contains("private Collection $dependants;"));
    assert!(user.contains("public function addDependant(User $dependant): static"));
    assert!(user.contains("$dependant->setGuardian($this);"));
}

#[test]
fn many_to_many_creates_missing_class() {
    let outcome = Scenario::new("many_to_many")
        .with_file(STUDENT_PATH, student())
        .text("Course")
        .text("students")
        .cardinality(Cardinality::ManyToMany)
        .text("Student")
        .enter()
        .enter()
        .enter()
        .run_entity(&harness())
        .unwrap();
    let report = outcome.report();

    assert_eq!(
        report.written.iter().map(ToString::to_string).collect::<Vec<_>>(),
        ["created: src/Entity/Course.php", "updated: src/Entity/Student.php"]
    );
    assert!(!report.transcript.iter().any(|l| l.contains("already exists")));

    let course = outcome.read(COURSE_PATH);
    assert!(course.contains("#[ORM\\ManyToMany(targetEntity: Student::class, inversedBy: 'courses')]"));
    assert!(course.contains("$this->students = new ArrayCollection();"));
    assert!(course.contains("$this->students->removeElement($student);"));

    let student = outcome.read(STUDENT_PATH);
    assert!(student.contains("#[ORM\\ManyToMany(targetEntity: Course::class, mappedBy: 'students')]"));
    assert!(student.contains("$course->addStudent($this);"));
    assert!(student.contains("$course->removeStudent($this);"));
}

#[test]
fn one_to_one_syncs_inverse_setter() {
    let outcome = Scenario::new("one_to_one")
        .with_file(USER_PATH, user())
        .with_file(PROFILE_PATH, user_profile())
        .text("UserProfile")
        .text("user")
        .text("OneToOne")
        .text("User")
        .no()
        .yes()
        .enter()
        .enter()
        .run_entity(&harness())
        .unwrap();
    outcome.report();

    let profile = outcome.read(PROFILE_PATH);
    assert!(profile.contains("inversedBy: 'userProfile'"));
    assert!(profile.contains("#[ORM\\JoinColumn(nullable: false)]\n    private ?User $user = null;"));
    assert!(profile.contains("public function setUser(User $user): static"));

    let user = outcome.read(USER_PATH);
    assert!(user.contains("mappedBy: 'user'"));
    assert!(user.contains("private ?UserProfile $userProfile = null;"));
    assert!(user.contains("$userProfile->setUser($this);"));
}

#[test]
fn custom_root_namespace() {
    let config = ScaffoldConfig::default().with_root_namespace("Custom");
    let outcome = Scenario::new("custom_root")
        .with_config(config)
        .text("Product")
        .text("title")
        .enter()
        .text("100")
        .yes()
        .enter()
        .run_entity(&harness())
        .unwrap();
    let report = outcome.report();

    assert_eq!(report.class, "Custom\\Entity\\Product");
    let product = outcome.read("src/Entity/Product.php");
    assert!(product.contains("namespace Custom\\Entity;"));
    assert!(product.contains("#[ORM\\Column(length: 100, nullable: true)]\n    private ?string $title = null;"));
    assert!(product.contains("public function setTitle(?string $title): static"));
}

#[test]
fn colliding_short_names_are_described_and_aliased() {
    let outcome = Scenario::new("friend_user")
        .with_file(USER_PATH, user())
        .with_file(FRIEND_USER_PATH, friend_user())
        .text("User")
        .text("friend")
        .text("relation")
        .text("Friend\\User")
        .cardinality(Cardinality::ManyToOne)
        .enter()
        .no()
        .enter()
        .run_entity(&harness())
        .unwrap();
    let report = outcome.report();

    assert!(report
        .transcript
        .iter()
        .any(|l| l.starts_with("ManyToOne    Each User relates to (has) one Friend\\User.")));
    assert_eq!(report.written.len(), 1);
    assert_eq!(outcome.read(FRIEND_USER_PATH), friend_user());

    let user = outcome.read(USER_PATH);
    assert!(user.contains("use App\\Entity\\Friend\\User as FriendUser;"));
    assert!(user.contains("private ?FriendUser $friend = null;"));
}

#[test]
fn existing_property_is_skipped() {
    let outcome = Scenario::new("existing_property")
        .with_file(USER_PATH, USER_WITH_NAME)
        .text("User")
        .text("name")
        .enter()
        .enter()
        .enter()
        .enter()
        .run_entity(&harness())
        .unwrap();
    let report = outcome.report();

    assert_eq!(report.skipped, ["User::name"]);
    assert!(report.written.is_empty());
    assert_eq!(
        report.transcript,
        ["Your entity already exists! So let's add some new fields!"]
    );
    assert_eq!(outcome.read(USER_PATH), USER_WITH_NAME);
}

#[test]
fn missing_related_class_writes_nothing() {
    let outcome = Scenario::new("missing_target")
        .with_file(USER_PATH, user())
        .text("User")
        .text("course")
        .text("ManyToOne")
        .text("Course")
        .run_entity(&harness())
        .unwrap();

    assert!(matches!(outcome.result, Err(ScaffoldError::InvalidInput(_))));
    assert!(!outcome.workspace.exists(COURSE_PATH));
    assert_eq!(outcome.read(USER_PATH), user());
}

#[test]
fn invalid_class_name_is_rejected() {
    let outcome = Scenario::new("invalid_name")
        .text("Bad-Name")
        .run_entity(&harness())
        .unwrap();
    assert!(matches!(outcome.result, Err(ScaffoldError::InvalidInput(_))));
}

#[test]
fn failed_commit_leaves_every_file_untouched() {
    let fs = MemoryFilesystem::new()
        .with_file(USER_PATH, user())
        .with_file(PHOTO_PATH, user_avatar_photo())
        .with_read_only(PHOTO_PATH);
    let layout = ProjectLayout::new(ScaffoldConfig::default());
    let renderer = AttributeTagRenderer::new();
    let mut answers = AnswerQueue::new([
        Answer::Text("User".into()),
        Answer::Text("photos".into()),
        Answer::Text("OneToMany".into()),
        Answer::Text("UserAvatarPhoto".into()),
        Answer::Default,
        Answer::Bool(true),
        Answer::Default,
    ]);

    let result = EntityMaker::new(&fs, &layout, &renderer, &EntitySkeleton).run(&mut answers);
    assert!(matches!(result, Err(ScaffoldError::Fs(_))));
    assert_eq!(fs.writes(), 0);
    assert_eq!(fs.read(Path::new(USER_PATH)).unwrap(), fixtures::user());
}

#[test]
fn exhausted_answers_abort() {
    let outcome = Scenario::new("exhausted")
        .with_file(USER_PATH, user())
        .text("User")
        .text("nickname")
        .run_entity(&harness())
        .unwrap();
    assert!(matches!(outcome.result, Err(ScaffoldError::Prompt(_))));
    assert_eq!(outcome.read(USER_PATH), user());
}
