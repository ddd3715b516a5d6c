// src/api/pagination.rs
//! Offset pagination against the upstream list interface.

use crate::constants::{ALM_FIRST_INDEX, ALM_PAGE_SIZE};
use crate::error::AppError;
use crate::model::{EntityPage, RawEntity};

/// Fetches every page of a list call, concatenating the results.
///
/// The cursor starts at 1 and advances by the page size. A page shorter
/// than the page size (including an empty one) is the terminal page. The
/// upstream's `TotalResults` field is deliberately ignored: it is
/// unreliable under combined filters, so completion is judged from
/// observed page length alone. The full result arrives in
/// `ceil(total / page_size)` round trips, plus one confirming empty page
/// when the total is an exact multiple of the page size.
pub async fn fetch_all_pages<F, Fut>(mut fetch_fn: F) -> Result<Vec<RawEntity>, AppError>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: std::future::Future<Output = Result<EntityPage, AppError>>,
{
    let mut all_entities = Vec::new();
    let mut start_index = ALM_FIRST_INDEX;

    loop {
        let page = fetch_fn(start_index, ALM_PAGE_SIZE).await?;
        let page_len = page.entities.len() as u32;
        all_entities.extend(page.entities);

        log::debug!(
            "Fetched {} entities (start={}, total={})",
            page_len,
            start_index,
            all_entities.len()
        );

        if page_len < ALM_PAGE_SIZE {
            break;
        }
        start_index += ALM_PAGE_SIZE;
    }

    Ok(all_entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlmErrorCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn synthetic_entities(total: usize) -> Vec<RawEntity> {
        (0..total)
            .map(|i| RawEntity::from_pairs("test", [("id", json!(i.to_string()))]))
            .collect()
    }

    async fn paged_fetch(all: &[RawEntity], start_index: u32, page_size: u32) -> EntityPage {
        let from = (start_index - 1) as usize;
        let to = (from + page_size as usize).min(all.len());
        EntityPage {
            entities: all.get(from..to).unwrap_or(&[]).to_vec(),
            // deliberately wrong: completion must not depend on it
            total_results: 9_999,
        }
    }

    #[tokio::test]
    async fn complete_without_gaps_or_duplicates_for_boundary_sizes() {
        for total in [0usize, 1, 99, 100, 101, 250, 1000] {
            let all = synthetic_entities(total);
            let calls = AtomicU32::new(0);

            let fetched = fetch_all_pages(|start, size| {
                calls.fetch_add(1, Ordering::SeqCst);
                let all = all.clone();
                async move { Ok(paged_fetch(&all, start, size).await) }
            })
            .await
            .unwrap();

            assert_eq!(fetched.len(), total, "N={}", total);
            for (i, entity) in fetched.iter().enumerate() {
                assert_eq!(entity.field_str("id").unwrap(), i.to_string());
            }

            let expected_calls = (total as u32 / ALM_PAGE_SIZE) + 1;
            assert_eq!(calls.load(Ordering::SeqCst), expected_calls, "N={}", total);
        }
    }

    #[tokio::test]
    async fn propagates_page_errors() {
        let result = fetch_all_pages(|_, _| async {
            Err::<EntityPage, _>(AppError::AlmService {
                code: AlmErrorCode::InternalError,
                message: "boom".to_string(),
            })
        })
        .await;
        assert!(result.is_err());
    }
}
