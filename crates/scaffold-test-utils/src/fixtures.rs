//! Class files used across test suites

use scaffold_core::ScaffoldConfig;

pub const USER_PATH: &str = "src/Entity/User.php";
pub const PHOTO_PATH: &str = "src/Entity/UserAvatarPhoto.php";
pub const FRIEND_USER_PATH: &str = "src/Entity/Friend/User.php";
pub const VENDOR_GROUP_PATH: &str = "vendor/some-vendor/src/Group.php";
pub const COURSE_PATH: &str = "src/Entity/Course.php";
pub const STUDENT_PATH: &str = "src/Entity/Student.php";
pub const PROFILE_PATH: &str = "src/Entity/UserProfile.php";

/// Entity with only a generated id
pub fn entity(namespace: &str, name: &str) -> String {
    format!(
        "<?php

namespace {namespace};

use Doctrine\\ORM\\Mapping as ORM;

#[ORM\\Entity]
class {name}
{{
    #[ORM\\Id]
    #[ORM\\GeneratedValue]
    #[ORM\\Column]
    private ?int $id = null;

    public function getId(): ?int
    {{
        return $this->id;
    }}
}}
"
    )
}

pub fn user() -> String {
    entity("App\\Entity", "User")
}

pub fn user_avatar_photo() -> String {
    entity("App\\Entity", "UserAvatarPhoto")
}

pub fn friend_user() -> String {
    entity("App\\Entity\\Friend", "User")
}

pub fn course() -> String {
    entity("App\\Entity", "Course")
}

pub fn student() -> String {
    entity("App\\Entity", "Student")
}

pub fn user_profile() -> String {
    entity("App\\Entity", "UserProfile")
}

/// Third-party class outside the source root
pub const VENDOR_GROUP: &str = "<?php

namespace Some\\Vendor;

class Group
{
    private ?string $name = null;

    public function getName(): ?string
    {
        return $this->name;
    }
}
";

/// Configuration mapping `Some\Vendor\` into the vendor directory
pub fn vendor_config() -> ScaffoldConfig {
    ScaffoldConfig::default().with_autoload("Some\\Vendor\\", "vendor/some-vendor/src")
}

/// User with a mapped `name` column and its accessors
pub const USER_WITH_NAME: &str = "<?php

namespace App\\Entity;

use Doctrine\\ORM\\Mapping as ORM;

#[ORM\\Entity]
class User
{
    #[ORM\\Id]
    #[ORM\\GeneratedValue]
    #[ORM\\Column]
    private ?int $id = null;

    #[ORM\\Column(length: 255)]
    private ?string $name = null;

    public function getId(): ?int
    {
        return $this->id;
    }

    public function getName(): ?string
    {
        return $this->name;
    }

    public function setName(string $name): static
    {
        $this->name = $name;

        return $this;
    }
}
";

/// User whose `getName` has an unparseable return type
pub const USER_INVALID_METHOD: &str = "<?php

namespace App\\Entity;

use Doctrine\\ORM\\Mapping as ORM;

#[ORM\\Entity]
class User
{
    #[ORM\\Id]
    #[ORM\\GeneratedValue]
    #[ORM\\Column]
    private ?int $id = null;

    #[ORM\\Column(length: 255)]
    private ?string $name = null;

    public function getId(): ?int
    {
        return $this->id;
    }

    public function getName(): ?string string
    {
        return $this->name;
    }
}
";

/// Same user after regeneration with overwrite
pub const USER_INVALID_METHOD_REGENERATED: &str = "<?php

namespace App\\Entity;

use Doctrine\\ORM\\Mapping as ORM;

#[ORM\\Entity]
class User
{
    #[ORM\\Id]
    #[ORM\\GeneratedValue]
    #[ORM\\Column]
    private ?int $id = null;

    #[ORM\\Column(length: 255)]
    private ?string $name = null;

    public function getId(): ?int
    {
        return $this->id;
    }

    public function getName(): ?string
    {
        return $this->name;
    }

    public function setName(string $name): static
    {
        $this->name = $name;

        return $this;
    }
}
";

/// Owning side of a many-to-many, mapping only
pub const CLIENT_PATH: &str = "src/Entity/Client.php";
pub const CLIENT: &str = "<?php

namespace App\\Entity;

use Doctrine\\Common\\Collections\\Collection;
use Doctrine\\ORM\\Mapping as ORM;

#[ORM\\Entity]
class Client
{
    #[ORM\\Id]
    #[ORM\\GeneratedValue]
    #[ORM\\Column]
    private ?int $id = null;

    #[ORM\\Column(length: 255, nullable: true)]
    private ?string $name = null;

    /**
     * @var Collection<int, Tag>
     */
    #[ORM\\ManyToMany(targetEntity: Tag::class, inversedBy: 'clients')]
    private Collection $tags;
}
";

/// Inverse side of [`CLIENT`], mapping only
pub const TAG_PATH: &str = "src/Entity/Tag.php";
pub const TAG: &str = "<?php

namespace App\\Entity;

use Doctrine\\Common\\Collections\\Collection;
use Doctrine\\ORM\\Mapping as ORM;

#[ORM\\Entity]
class Tag
{
    #[ORM\\Id]
    #[ORM\\GeneratedValue]
    #[ORM\\Column]
    private ?int $id = null;

    /**
     * @var Collection<int, Client>
     */
    #[ORM\\ManyToMany(targetEntity: Client::class, mappedBy: 'tags')]
    private Collection $clients;
}
";
