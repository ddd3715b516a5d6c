// src/model/kind.rs
//! The closed set of entity kinds the upstream serves, and the
//! parent/child relations that define the two extraction families.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every kind of record the upstream system can return.
///
/// `Attachment` is deliberately a single kind here: the upstream serves all
/// attachments through one endpoint, distinguished only by a parent-type
/// filter. Storage fans them out per parent kind (see the collection
/// router), which is where "test attachment" and "folder attachment"
/// become different things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Domain,
    Project,
    Folder,
    Test,
    DesignStep,
    Release,
    Cycle,
    TestSet,
    Run,
    Defect,
    Attachment,
}

impl EntityKind {
    /// The `entity_type` tag written into stored records.
    ///
    /// Attachments do not have a single tag; theirs depends on the parent
    /// kind (see [`EntityKind::attachment_tag`]).
    pub fn storage_tag(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Project => "project",
            Self::Folder => "folder",
            Self::Test => "test",
            Self::DesignStep => "design-step",
            Self::Release => "release",
            Self::Cycle => "cycle",
            Self::TestSet => "test-set",
            Self::Run => "run",
            Self::Defect => "defect",
            Self::Attachment => "attachment",
        }
    }

    /// The `entity_type` tag for an attachment whose parent is `self`.
    pub fn attachment_tag(&self) -> Option<&'static str> {
        match self {
            Self::Folder => Some("folder-attachment"),
            Self::Test => Some("test-attachment"),
            Self::DesignStep => Some("design-step-attachment"),
            Self::TestSet => Some("test-set-attachment"),
            Self::Defect => Some("defect-attachment"),
            _ => None,
        }
    }

    /// The parent-type value the upstream attachment endpoint filters on.
    pub fn upstream_parent_type(&self) -> Option<&'static str> {
        match self {
            Self::Folder => Some("test-folder"),
            Self::Test => Some("test"),
            Self::DesignStep => Some("design-step"),
            Self::TestSet => Some("test-set"),
            Self::Defect => Some("defect"),
            _ => None,
        }
    }

    /// Child kinds fetched when expanding one level under an entity of
    /// this kind. Order matters: container kinds come before leaf kinds so
    /// a depth-first walk descends into subtrees first.
    pub fn child_kinds(&self) -> &'static [EntityKind] {
        match self {
            Self::Folder => &[Self::Folder, Self::Test, Self::Attachment],
            Self::Test => &[Self::DesignStep, Self::Attachment],
            Self::DesignStep => &[Self::Attachment],
            Self::Release => &[Self::Cycle],
            Self::Cycle => &[Self::TestSet],
            Self::TestSet => &[Self::Run, Self::Attachment],
            Self::Defect => &[Self::Attachment],
            Self::Domain => &[Self::Project],
            Self::Project | Self::Run | Self::Attachment => &[],
        }
    }

    /// Whether a recursive extraction may start at this kind.
    pub fn is_walk_root(&self) -> bool {
        matches!(self, Self::Folder | Self::Release | Self::Defect)
    }

    /// Parses the kind tag used on the CLI and in job records.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "domain" => Some(Self::Domain),
            "project" => Some(Self::Project),
            "folder" => Some(Self::Folder),
            "test" => Some(Self::Test),
            "design-step" => Some(Self::DesignStep),
            "release" => Some(Self::Release),
            "cycle" => Some(Self::Cycle),
            "test-set" => Some(Self::TestSet),
            "run" => Some(Self::Run),
            "defect" => Some(Self::Defect),
            "attachment" => Some(Self::Attachment),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_tag())
    }
}
