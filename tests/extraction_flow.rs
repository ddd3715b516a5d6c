// tests/extraction_flow.rs
//! End-to-end extraction flows against a scripted upstream.

mod common;

use alm2store::{Collection, DocumentStore, EntityKind, Filter, JobStatus};
use common::{baseline_tree, entity_id, harness, FixtureEntity, MockAlm};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn recursive_extraction_stores_the_whole_subtree() {
    let h = harness(MockAlm::new(baseline_tree()).with_content("5001", b"png-bytes")).await;

    let job = h
        .extractor
        .extract_recursive(EntityKind::Folder, &entity_id("1"))
        .await
        .expect("extraction runs");

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.counters.folders, 3);
    assert_eq!(job.counters.tests, 1);
    assert_eq!(job.counters.design_steps, 2);
    assert_eq!(job.counters.attachments, 1);
    assert_eq!(job.counters.attachments_downloaded, 1);
    assert!(job.error.is_none());

    // collections hold exactly the fixture records
    assert_eq!(h.store.len(Collection::TestplanFolders), 3);
    assert_eq!(h.store.len(Collection::TestplanTests), 1);
    assert_eq!(h.store.len(Collection::TestplanDesignSteps), 2);
    assert_eq!(h.store.len(Collection::TestplanTestAttachments), 1);
    assert_eq!(h.store.len(Collection::TestplanFolderAttachments), 0);
    assert_eq!(h.store.len(Collection::AttachmentFiles), 1);

    // the parent chain is intact
    let folders = h.store.dump(Collection::TestplanFolders);
    let parent_of = |id: &str| {
        folders
            .iter()
            .find(|d| d["id"] == json!(id))
            .and_then(|d| d["parent_id"].as_str().map(str::to_string))
    };
    assert_eq!(parent_of("2").as_deref(), Some("1"));
    assert_eq!(parent_of("3").as_deref(), Some("1"));

    let tests = h.store.dump(Collection::TestplanTests);
    assert_eq!(tests[0]["parent_id"], json!("1"));
    assert_eq!(tests[0]["entity_type"], json!("test"));

    for step in h.store.dump(Collection::TestplanDesignSteps) {
        assert_eq!(step["parent_id"], json!("100"));
    }

    // the job is queryable by id afterward
    let polled = h.extractor.get_job(&job.job_id).await.unwrap();
    assert_eq!(polled.status, JobStatus::Completed);
    assert_eq!(polled.counters, job.counters);
}

#[tokio::test]
async fn one_level_expansion_does_not_descend() {
    let h = harness(MockAlm::new(baseline_tree()).with_content("5001", b"png-bytes")).await;

    let counts = h
        .extractor
        .expand_one_level(EntityKind::Folder, &entity_id("1"))
        .await
        .expect("expansion runs");

    assert_eq!(counts.folders, 2);
    assert_eq!(counts.tests, 1);
    assert_eq!(counts.attachments, 0);

    // T1's own children need a further expansion of T1
    assert!(h.store.is_empty(Collection::TestplanDesignSteps));
    assert!(h.store.is_empty(Collection::TestplanTestAttachments));

    let counts = h
        .extractor
        .expand_one_level(EntityKind::Test, &entity_id("100"))
        .await
        .expect("expansion runs");
    assert_eq!(counts.design_steps, 2);
    assert_eq!(counts.attachments, 1);
    assert_eq!(h.store.len(Collection::TestplanDesignSteps), 2);
}

#[tokio::test]
async fn repeated_expansion_is_idempotent_over_storage() {
    let h = harness(MockAlm::new(baseline_tree())).await;

    let first = h
        .extractor
        .expand_one_level(EntityKind::Folder, &entity_id("1"))
        .await
        .unwrap();
    let folders_after_first = h.store.dump(Collection::TestplanFolders);

    let second = h
        .extractor
        .expand_one_level(EntityKind::Folder, &entity_id("1"))
        .await
        .unwrap();
    let folders_after_second = h.store.dump(Collection::TestplanFolders);

    assert_eq!(first, second);
    assert_eq!(folders_after_first, folders_after_second);
    assert_eq!(h.store.len(Collection::TestplanFolders), 2);
    assert_eq!(h.store.len(Collection::TestplanTests), 1);
}

#[tokio::test]
async fn attachments_of_different_parents_never_share_a_collection() {
    let mut tree = baseline_tree();
    tree.push(FixtureEntity::attachment(
        "6001",
        "folder-notes.txt",
        "1",
        EntityKind::Folder,
    ));
    let h = harness(
        MockAlm::new(tree)
            .with_content("5001", b"png")
            .with_content("6001", b"txt"),
    )
    .await;

    h.extractor
        .extract_recursive(EntityKind::Folder, &entity_id("1"))
        .await
        .unwrap();

    let folder_attachments = h.store.dump(Collection::TestplanFolderAttachments);
    let test_attachments = h.store.dump(Collection::TestplanTestAttachments);
    assert_eq!(folder_attachments.len(), 1);
    assert_eq!(test_attachments.len(), 1);
    assert_eq!(folder_attachments[0]["id"], json!("6001"));
    assert_eq!(folder_attachments[0]["entity_type"], json!("folder-attachment"));
    assert_eq!(test_attachments[0]["id"], json!("5001"));
    assert_eq!(test_attachments[0]["entity_type"], json!("test-attachment"));
}

#[tokio::test]
async fn testlab_family_walks_release_to_runs() {
    let tree = vec![
        FixtureEntity::new(EntityKind::Release, "10", "R2026.08", None),
        FixtureEntity::new(EntityKind::Cycle, "20", "Sprint 1", Some("10")),
        FixtureEntity::new(EntityKind::TestSet, "30", "Smoke", Some("20")),
        FixtureEntity::new(EntityKind::Run, "40", "Run A", Some("30"))
            .with_field("status", json!("Passed")),
        FixtureEntity::new(EntityKind::Run, "41", "Run B", Some("30"))
            .with_field("status", json!("Failed")),
        FixtureEntity::attachment("7001", "log.zip", "30", EntityKind::TestSet),
    ];
    let h = harness(MockAlm::new(tree).with_content("7001", b"zip")).await;

    let job = h
        .extractor
        .extract_recursive(EntityKind::Release, &entity_id("10"))
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.counters.releases, 1);
    assert_eq!(job.counters.cycles, 1);
    assert_eq!(job.counters.test_sets, 1);
    assert_eq!(job.counters.runs, 2);
    assert_eq!(job.counters.attachments, 1);
    assert_eq!(h.store.len(Collection::TestlabTestsetAttachments), 1);
    assert_eq!(h.store.len(Collection::TestlabTestruns), 2);
}

#[tokio::test]
async fn defect_root_extracts_its_attachments() {
    let tree = vec![
        FixtureEntity::new(EntityKind::Defect, "500", "Login button dead", None)
            .with_field("severity", json!("2-High"))
            .with_field("status", json!("Open")),
        FixtureEntity::attachment("8001", "screenshot.png", "500", EntityKind::Defect),
    ];
    let h = harness(MockAlm::new(tree).with_content("8001", b"png")).await;

    let job = h
        .extractor
        .extract_recursive(EntityKind::Defect, &entity_id("500"))
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.counters.defects, 1);
    assert_eq!(job.counters.attachments, 1);
    assert_eq!(job.counters.attachments_downloaded, 1);
    assert_eq!(h.store.len(Collection::Defects), 1);
    assert_eq!(h.store.len(Collection::DefectAttachments), 1);

    let attachments = h.store.dump(Collection::DefectAttachments);
    assert_eq!(attachments[0]["entity_type"], json!("defect-attachment"));
    assert_eq!(attachments[0]["parent_id"], json!("500"));
}

#[tokio::test]
async fn rerun_extraction_counts_fully_in_each_job_without_duplicating_storage() {
    let h = harness(MockAlm::new(baseline_tree()).with_content("5001", b"png")).await;

    let first = h
        .extractor
        .extract_recursive(EntityKind::Folder, &entity_id("1"))
        .await
        .unwrap();
    let second = h
        .extractor
        .extract_recursive(EntityKind::Folder, &entity_id("1"))
        .await
        .unwrap();

    // each run is its own job with the full counts
    assert_ne!(first.job_id, second.job_id);
    assert_eq!(first.counters, second.counters);
    assert_eq!(second.counters.folders, 3);

    // storage state is the same as after a single run
    assert_eq!(h.store.len(Collection::TestplanFolders), 3);
    assert_eq!(h.store.len(Collection::TestplanTests), 1);
    assert_eq!(h.store.len(Collection::TestplanDesignSteps), 2);
    assert_eq!(h.store.len(Collection::TestplanTestAttachments), 1);
    assert_eq!(h.store.len(Collection::AttachmentFiles), 1);
}

#[tokio::test]
async fn failed_download_keeps_metadata_and_counts_the_gap() {
    // no content registered for the attachment: every download fails
    let h = harness(MockAlm::new(baseline_tree())).await;

    let job = h
        .extractor
        .extract_recursive(EntityKind::Folder, &entity_id("1"))
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Completed, "download failures are not fatal");
    assert_eq!(job.counters.attachments, 1);
    assert_eq!(job.counters.attachments_downloaded, 0);
    assert!(h.alm.download_calls() >= 1, "the download was attempted");
    // metadata stored even though the binary never arrived
    assert_eq!(h.store.len(Collection::TestplanTestAttachments), 1);
    assert!(h.store.is_empty(Collection::AttachmentFiles));
}

#[tokio::test]
async fn assembled_tree_mirrors_the_parent_chain() {
    let h = harness(MockAlm::new(baseline_tree()).with_content("5001", b"png")).await;
    h.extractor
        .extract_recursive(EntityKind::Folder, &entity_id("1"))
        .await
        .unwrap();

    let tree = h
        .extractor
        .assemble_tree(EntityKind::Folder, &entity_id("1"))
        .await
        .unwrap();

    assert_eq!(tree.id, "1");
    assert_eq!(tree.entity_type, "folder");
    let child_ids: Vec<&str> = tree.children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(child_ids, vec!["2", "3", "100"]);

    let t1 = tree.children.iter().find(|c| c.id == "100").unwrap();
    assert_eq!(t1.entity_type, "test");
    assert_eq!(t1.children.len(), 3, "two steps and one attachment");
}

#[tokio::test]
async fn scope_discovery_mirrors_domains_and_projects() {
    let h = harness(
        MockAlm::new(vec![])
            .with_domains(&["FINANCE", "RETAIL"])
            .with_projects("FINANCE", &["Payments", "Ledger"]),
    )
    .await;

    let domains = h.extractor.discover_domains().await.unwrap();
    assert_eq!(domains.len(), 2);
    assert_eq!(domains[0].id.as_str(), "FINANCE");
    assert_eq!(domains[0].owner, h.owner);

    let projects = h.extractor.discover_projects("FINANCE").await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].parent_id.as_ref().unwrap().as_str(), "FINANCE");

    assert_eq!(h.store.len(Collection::Domains), 2);
    assert_eq!(h.store.len(Collection::Projects), 2);

    let stored = h
        .store
        .find(Collection::Projects, &Filter::new().field("parent_id", "FINANCE"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
}
