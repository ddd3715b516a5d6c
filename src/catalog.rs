// src/catalog.rs
//! Storage layout: the collection router and the per-collection field
//! display catalog.
//!
//! The router is the single authority on where a record lives. Attachments
//! deliberately fan out into one collection per parent kind so that "test
//! attachments" and "folder attachments" stay independently queryable
//! without a runtime filter on parent type.

use crate::error::AppError;
use crate::model::EntityKind;
use std::fmt;

/// Every storage collection the engine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Domains,
    Projects,
    TestplanFolders,
    TestplanTests,
    TestplanDesignSteps,
    TestplanFolderAttachments,
    TestplanTestAttachments,
    TestplanStepAttachments,
    TestlabReleases,
    TestlabReleaseCycles,
    TestlabTestsets,
    TestlabTestruns,
    TestlabTestsetAttachments,
    Defects,
    DefectAttachments,
    AttachmentFiles,
    ExtractionJobs,
}

impl Collection {
    /// Every collection, for exhaustive exports and admin tooling.
    pub const ALL: [Collection; 17] = [
        Self::Domains,
        Self::Projects,
        Self::TestplanFolders,
        Self::TestplanTests,
        Self::TestplanDesignSteps,
        Self::TestplanFolderAttachments,
        Self::TestplanTestAttachments,
        Self::TestplanStepAttachments,
        Self::TestlabReleases,
        Self::TestlabReleaseCycles,
        Self::TestlabTestsets,
        Self::TestlabTestruns,
        Self::TestlabTestsetAttachments,
        Self::Defects,
        Self::DefectAttachments,
        Self::AttachmentFiles,
        Self::ExtractionJobs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domains => "domains",
            Self::Projects => "projects",
            Self::TestplanFolders => "testplan_folders",
            Self::TestplanTests => "testplan_tests",
            Self::TestplanDesignSteps => "testplan_design_steps",
            Self::TestplanFolderAttachments => "testplan_folder_attachments",
            Self::TestplanTestAttachments => "testplan_test_attachments",
            Self::TestplanStepAttachments => "testplan_step_attachments",
            Self::TestlabReleases => "testlab_releases",
            Self::TestlabReleaseCycles => "testlab_release_cycles",
            Self::TestlabTestsets => "testlab_testsets",
            Self::TestlabTestruns => "testlab_testruns",
            Self::TestlabTestsetAttachments => "testlab_testset_attachments",
            Self::Defects => "defects",
            Self::DefectAttachments => "defect_attachments",
            Self::AttachmentFiles => "attachment_files",
            Self::ExtractionJobs => "extraction_jobs",
        }
    }

    /// Maps an entity kind (plus, for attachments, its parent kind) to the
    /// collection it belongs in.
    ///
    /// An unroutable combination is a configuration defect, not a runtime
    /// condition: it fails loudly instead of silently corrupting the
    /// collection layout.
    pub fn resolve(
        kind: EntityKind,
        parent_kind: Option<EntityKind>,
    ) -> Result<Self, AppError> {
        let unroutable = || AppError::UnroutableEntity {
            kind: kind.storage_tag().to_string(),
            parent: parent_kind
                .map(|p| p.storage_tag().to_string())
                .unwrap_or_else(|| "none".to_string()),
        };

        match kind {
            EntityKind::Domain => Ok(Self::Domains),
            EntityKind::Project => Ok(Self::Projects),
            EntityKind::Folder => Ok(Self::TestplanFolders),
            EntityKind::Test => Ok(Self::TestplanTests),
            EntityKind::DesignStep => Ok(Self::TestplanDesignSteps),
            EntityKind::Release => Ok(Self::TestlabReleases),
            EntityKind::Cycle => Ok(Self::TestlabReleaseCycles),
            EntityKind::TestSet => Ok(Self::TestlabTestsets),
            EntityKind::Run => Ok(Self::TestlabTestruns),
            EntityKind::Defect => Ok(Self::Defects),
            EntityKind::Attachment => match parent_kind {
                Some(EntityKind::Folder) => Ok(Self::TestplanFolderAttachments),
                Some(EntityKind::Test) => Ok(Self::TestplanTestAttachments),
                Some(EntityKind::DesignStep) => Ok(Self::TestplanStepAttachments),
                Some(EntityKind::TestSet) => Ok(Self::TestlabTestsetAttachments),
                Some(EntityKind::Defect) => Ok(Self::DefectAttachments),
                _ => Err(unroutable()),
            },
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static display configuration for one field of a collection.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: &'static str,
    pub alias: &'static str,
    pub sequence: u32,
    pub display: bool,
}

const fn spec(field: &'static str, alias: &'static str, sequence: u32, display: bool) -> FieldSpec {
    FieldSpec {
        field,
        alias,
        sequence,
        display,
    }
}

static DOMAIN_FIELDS: [FieldSpec; 4] = [
    spec("user", "Username", 1, true),
    spec("id", "Domain ID", 2, true),
    spec("name", "Domain Name", 3, true),
    spec("parent_id", "Parent ID", 4, true),
];

static PROJECT_FIELDS: [FieldSpec; 4] = [
    spec("user", "Username", 1, true),
    spec("id", "Project ID", 2, true),
    spec("name", "Project Name", 3, true),
    spec("parent_id", "Domain", 4, true),
];

static FOLDER_FIELDS: [FieldSpec; 5] = [
    spec("user", "Username", 1, true),
    spec("id", "Folder ID", 2, true),
    spec("name", "Folder Name", 3, true),
    spec("parent_id", "Parent Folder ID", 4, true),
    spec("description", "Description", 5, true),
];

static TEST_FIELDS: [FieldSpec; 8] = [
    spec("user", "Username", 1, true),
    spec("id", "Test ID", 2, true),
    spec("name", "Test Name", 3, true),
    spec("parent_id", "Parent Folder ID", 4, true),
    spec("status", "Status", 5, true),
    spec("owner", "Owner", 6, true),
    spec("description", "Description", 7, true),
    spec("creation-time", "Created On", 8, true),
];

static DESIGN_STEP_FIELDS: [FieldSpec; 7] = [
    spec("user", "Username", 1, true),
    spec("id", "Step ID", 2, true),
    spec("name", "Step Name", 3, true),
    spec("parent_id", "Test ID", 4, true),
    spec("step-order", "Step Order", 5, true),
    spec("description", "Description", 6, true),
    spec("expected", "Expected Result", 7, true),
];

static RELEASE_FIELDS: [FieldSpec; 7] = [
    spec("user", "Username", 1, true),
    spec("id", "Release ID", 2, true),
    spec("name", "Release Name", 3, true),
    spec("parent_id", "Project ID", 4, true),
    spec("start-date", "Start Date", 5, true),
    spec("end-date", "End Date", 6, true),
    spec("description", "Description", 7, true),
];

static CYCLE_FIELDS: [FieldSpec; 6] = [
    spec("user", "Username", 1, true),
    spec("id", "Cycle ID", 2, true),
    spec("name", "Cycle Name", 3, true),
    spec("parent_id", "Release ID", 4, true),
    spec("start-date", "Start Date", 5, true),
    spec("end-date", "End Date", 6, true),
];

static TESTSET_FIELDS: [FieldSpec; 6] = [
    spec("user", "Username", 1, true),
    spec("id", "Test Set ID", 2, true),
    spec("name", "Test Set Name", 3, true),
    spec("parent_id", "Cycle ID", 4, true),
    spec("status", "Status", 5, true),
    spec("open-date", "Open Date", 6, true),
];

static TESTRUN_FIELDS: [FieldSpec; 8] = [
    spec("user", "Username", 1, true),
    spec("id", "Test Run ID", 2, true),
    spec("name", "Test Run Name", 3, true),
    spec("parent_id", "Test Set ID", 4, true),
    spec("test-id", "Test Case ID", 5, true),
    spec("status", "Status", 6, true),
    spec("owner", "Owner", 7, true),
    spec("execution-date", "Execution Date", 8, true),
];

static DEFECT_FIELDS: [FieldSpec; 13] = [
    spec("user", "Username", 1, true),
    spec("id", "Defect ID", 2, true),
    spec("name", "Defect Summary", 3, true),
    spec("parent_id", "Project ID", 4, true),
    spec("status", "Status", 5, true),
    spec("severity", "Severity", 6, true),
    spec("priority", "Priority", 7, true),
    spec("owner", "Owner", 8, true),
    spec("detected-by", "Detected By", 9, true),
    spec("creation-time", "Created On", 10, true),
    spec("detected-in-rcyc", "Detected In Cycle", 11, true),
    spec("has-attachments", "Has Attachments", 12, true),
    spec("description", "Description", 13, true),
];

/// Shared shape of every attachment collection; only the parent alias
/// differs.
macro_rules! attachment_fields {
    ($parent_alias:expr) => {
        [
            spec("user", "Username", 1, true),
            spec("id", "Attachment ID", 2, true),
            spec("name", "File Name", 3, true),
            spec("parent_id", $parent_alias, 4, false),
            spec("parent-type", "Parent Type", 5, false),
            spec("file-size", "File Size", 6, true),
            spec("description", "Description", 7, true),
        ]
    };
}

static FOLDER_ATTACHMENT_FIELDS: [FieldSpec; 7] = attachment_fields!("Folder ID");
static TEST_ATTACHMENT_FIELDS: [FieldSpec; 7] = attachment_fields!("Test ID");
static STEP_ATTACHMENT_FIELDS: [FieldSpec; 7] = attachment_fields!("Step ID");
static TESTSET_ATTACHMENT_FIELDS: [FieldSpec; 7] = attachment_fields!("Test Set ID");
static DEFECT_ATTACHMENT_FIELDS: [FieldSpec; 7] = attachment_fields!("Defect ID");

/// Field display configuration for a collection, ordered by sequence.
///
/// Collections that hold engine-internal documents (jobs, cached binaries)
/// have no display configuration and return the empty slice.
pub fn field_config(collection: Collection) -> &'static [FieldSpec] {
    match collection {
        Collection::Domains => &DOMAIN_FIELDS,
        Collection::Projects => &PROJECT_FIELDS,
        Collection::TestplanFolders => &FOLDER_FIELDS,
        Collection::TestplanTests => &TEST_FIELDS,
        Collection::TestplanDesignSteps => &DESIGN_STEP_FIELDS,
        Collection::TestplanFolderAttachments => &FOLDER_ATTACHMENT_FIELDS,
        Collection::TestplanTestAttachments => &TEST_ATTACHMENT_FIELDS,
        Collection::TestplanStepAttachments => &STEP_ATTACHMENT_FIELDS,
        Collection::TestlabReleases => &RELEASE_FIELDS,
        Collection::TestlabReleaseCycles => &CYCLE_FIELDS,
        Collection::TestlabTestsets => &TESTSET_FIELDS,
        Collection::TestlabTestruns => &TESTRUN_FIELDS,
        Collection::TestlabTestsetAttachments => &TESTSET_ATTACHMENT_FIELDS,
        Collection::Defects => &DEFECT_FIELDS,
        Collection::DefectAttachments => &DEFECT_ATTACHMENT_FIELDS,
        Collection::AttachmentFiles | Collection::ExtractionJobs => &[],
    }
}
