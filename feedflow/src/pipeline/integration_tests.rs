//! End-to-end tests of the pipeline over a scratch storage root.

#[cfg(test)]
mod tests {
    use crate::config::{AllowSet, PipelineConfig};
    use crate::errors::FeedflowError;
    use crate::events::CollectingEventSink;
    use crate::fetch::{FetchContext, FetchSource, MockFetcher};
    use crate::pipeline::Pipeline;
    use crate::results::encode;
    use crate::storage::{Extension, FsStageStore, Stage, StageStore};
    use crate::testing::{
        feed_xml, item_xml, test_config, FailingFetcher, StaticFetcher, TEST_SOURCE,
    };
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn pipeline(
        dir: &TempDir,
        config: PipelineConfig,
        body: String,
    ) -> Pipeline<FsStageStore, StaticFetcher> {
        Pipeline::new(config, FsStageStore::new(dir.path()), StaticFetcher::new(body))
    }

    fn files(store: &FsStageStore, stage: Stage) -> usize {
        store.list(stage).unwrap().len()
    }

    fn ids<S: StageStore, F: crate::fetch::Fetcher>(pipeline: &Pipeline<S, F>) -> Vec<String> {
        pipeline
            .results()
            .unwrap()
            .iter()
            .map(|record| record.product()["id"].clone())
            .collect()
    }

    #[tokio::test]
    async fn test_three_items_end_to_end() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path()).with_allowed_fetch_numbers(AllowSet::new([3]));
        let pipeline = pipeline(&dir, config, feed_xml(3));

        let fetched = pipeline.fetch().await.unwrap();
        assert_eq!(fetched.sources.len(), 1);
        assert_eq!(fetched.sources[0].items, 3);
        assert_eq!(files(pipeline.store(), Stage::Raw), 1);

        let requests = pipeline.fetcher().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, TEST_SOURCE);
        assert!(requests[0].options.query.is_empty());

        let split = pipeline.split().unwrap();
        assert_eq!(split.items.len(), 3);
        assert_eq!(files(pipeline.store(), Stage::Process), 3);

        let processed = pipeline.process().unwrap();
        assert_eq!(processed.processed, 3);
        assert_eq!(processed.results.total, 3);
        assert!(processed.results.created);
        assert_eq!(files(pipeline.store(), Stage::Process), 0);
        assert_eq!(files(pipeline.store(), Stage::Processed), 3);
        assert_eq!(files(pipeline.store(), Stage::Results), 1);

        let records = pipeline.results().unwrap();
        assert_eq!(records.len(), 3);
        let mut seen = ids(&pipeline);
        seen.sort();
        assert_eq!(seen, vec!["1", "2", "3"]);
        assert_eq!(
            records[0].localized("en").unwrap().title,
            format!("Title {}", records[0].product()["id"])
        );

        let again = pipeline.process().unwrap_err();
        assert!(matches!(again, FeedflowError::EmptyInput { operation: "process" }));
        assert_eq!(pipeline.results().unwrap(), records);
    }

    #[tokio::test]
    async fn test_process_respects_cycle_limit_and_prepends() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path())
            .with_allowed_fetch_numbers(AllowSet::new([5]))
            .with_max_process_per_cycle(2);
        let pipeline = pipeline(&dir, config, feed_xml(5));
        pipeline.fetch().await.unwrap();
        pipeline.split().unwrap();

        let first = pipeline.process().unwrap();
        let first_ids = ids(&pipeline);
        let second = pipeline.process().unwrap();
        let third = pipeline.process().unwrap();

        assert_eq!((first.processed, second.processed, third.processed), (2, 2, 1));
        assert_eq!(third.results.total, 5);
        assert!(!third.results.created);
        assert_eq!(files(pipeline.store(), Stage::Results), 1);
        assert_eq!(&ids(&pipeline)[3..], &first_ids[..]);
    }

    #[tokio::test]
    async fn test_count_outside_allow_set_leaves_raw_empty() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, test_config(dir.path()), feed_xml(3));
        pipeline
            .store()
            .save(Stage::Raw, &feed_xml(20), Extension::Xml, true)
            .unwrap();

        let err = pipeline.fetch().await.unwrap_err();

        assert!(matches!(
            err,
            FeedflowError::CountValidationFailed { count: 3, ref allowed } if allowed == &vec![20, 200, 2000]
        ));
        assert_eq!(files(pipeline.store(), Stage::Raw), 0);
        assert!(matches!(
            pipeline.split(),
            Err(FeedflowError::EmptyInput { operation: "split" })
        ));
    }

    #[tokio::test]
    async fn test_malformed_feed_is_a_parse_failure() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, test_config(dir.path()), "<products><product>".to_string());

        assert!(matches!(pipeline.fetch().await, Err(FeedflowError::ParseFailure(_))));
        assert_eq!(files(pipeline.store(), Stage::Raw), 0);
    }

    #[test]
    fn test_two_results_files_fail_without_touching_items() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, test_config(dir.path()), String::new());
        let store = pipeline.store();
        store.save(Stage::Process, &item_xml("1"), Extension::Xml, true).unwrap();
        store.save(Stage::Results, &encode(&[]).unwrap(), Extension::Txt, true).unwrap();
        store.save(Stage::Results, &encode(&[]).unwrap(), Extension::Txt, true).unwrap();

        let err = pipeline.process().unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(files(store, Stage::Process), 1);
        assert_eq!(files(store, Stage::Processed), 0);
        assert_eq!(files(store, Stage::Results), 2);
    }

    #[test]
    fn test_empty_process_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, test_config(dir.path()), String::new());

        let err = pipeline.process().unwrap_err();

        assert!(matches!(err, FeedflowError::EmptyInput { operation: "process" }));
        assert!(!pipeline.store().stage_dir(Stage::Results).exists());
        assert!(!pipeline.store().stage_dir(Stage::Processed).exists());
    }

    #[test]
    fn test_unconvertible_item_stays_pending() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, test_config(dir.path()), String::new());
        let store = pipeline.store();
        store.save(Stage::Process, "<product id=\"1\">", Extension::Xml, true).unwrap();

        assert!(matches!(pipeline.process(), Err(FeedflowError::ParseFailure(_))));
        assert_eq!(files(store, Stage::Process), 1);
        assert!(!store.stage_dir(Stage::Results).exists());
    }

    #[tokio::test]
    async fn test_transport_error_is_reported() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = Pipeline::new(
            test_config(dir.path()),
            FsStageStore::new(dir.path()),
            FailingFetcher::new("connection refused"),
        )
        .with_event_sink(sink.clone());

        let err = pipeline.fetch().await.unwrap_err();

        assert!(matches!(err, FeedflowError::Transport { ref message, .. } if message == "connection refused"));
        assert_eq!(sink.event_types(), vec!["fetch.started", "fetch.failed"]);
        let payload = sink.events()[1].1.clone().unwrap();
        assert_eq!(payload["code"], "TRANSPORT");
    }

    #[tokio::test]
    async fn test_marker_source_requests_active_page_size() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig::new(dir.path())
            .with_sources(vec![FetchSource::new("http://feeds.test/data.xml", FetchContext::Marker)]);

        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|request| {
                request.url == "http://feeds.test/data.xml"
                    && request.options.query.get("total").map(String::as_str) == Some("20")
                    && request.options.headers.get("Content-Type").map(String::as_str)
                        == Some("application/xml")
            })
            .times(1)
            .returning(|_| Ok(feed_xml(20)));

        let pipeline = Pipeline::new(config, FsStageStore::new(dir.path()), fetcher);
        let report = pipeline.fetch().await.unwrap();

        assert_eq!(report.sources[0].items, 20);
    }

    #[tokio::test]
    async fn test_invalid_marker_size_fails_before_fetching() {
        let dir = TempDir::new().unwrap();
        let mut config = PipelineConfig::new(dir.path())
            .with_sources(vec![FetchSource::new("http://feeds.test/data.xml", FetchContext::Marker)]);
        config.marker.active_fetch_number = 50;

        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().never();

        let pipeline = Pipeline::new(config, FsStageStore::new(dir.path()), fetcher);
        assert!(matches!(
            pipeline.fetch().await,
            Err(FeedflowError::InvalidFetchSize { requested: 50, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_replaces_previous_raw_feed() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path()).with_allowed_fetch_numbers(AllowSet::new([2]));
        let pipeline = pipeline(&dir, config, feed_xml(2));

        let first = pipeline.fetch().await.unwrap();
        let second = pipeline.fetch().await.unwrap();

        assert_eq!(second.cleared, 1);
        assert_eq!(pipeline.store().list(Stage::Raw).unwrap(), vec![second.sources[0].path.clone()]);
        assert!(!first.sources[0].path.exists());
    }

    #[test]
    fn test_held_lock_blocks_process() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, test_config(dir.path()), String::new());
        pipeline
            .store()
            .save(Stage::Process, &item_xml("1"), Extension::Xml, true)
            .unwrap();

        let held = pipeline.store().lock(Stage::Process).unwrap();
        assert!(matches!(pipeline.process(), Err(FeedflowError::StageLocked { .. })));
        assert_eq!(files(pipeline.store(), Stage::Process), 1);

        drop(held);
        assert_eq!(pipeline.process().unwrap().processed, 1);
    }

    #[test]
    fn test_held_process_lock_blocks_split() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, test_config(dir.path()), String::new());
        pipeline
            .store()
            .save(Stage::Raw, &feed_xml(2), Extension::Xml, true)
            .unwrap();

        let held = pipeline.store().lock(Stage::Process).unwrap();
        assert!(matches!(
            pipeline.split(),
            Err(FeedflowError::StageLocked { ref stage, .. }) if stage == "process"
        ));
        assert_eq!(files(pipeline.store(), Stage::Process), 0);

        drop(held);
        assert_eq!(pipeline.split().unwrap().items.len(), 2);
        assert_eq!(files(pipeline.store(), Stage::Process), 2);
    }

    #[test]
    fn test_item_with_foreign_extension_is_archived_once() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, test_config(dir.path()), String::new());
        let process = pipeline.store().stage_dir(Stage::Process);
        fs::create_dir_all(&process).unwrap();
        fs::write(process.join("item.XML"), item_xml("1")).unwrap();

        let report = pipeline.process().unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.results.total, 1);
        assert!(report.archived[0].to_str().unwrap().ends_with(".XML"));

        let again = pipeline.process().unwrap_err();
        assert!(matches!(again, FeedflowError::EmptyInput { operation: "process" }));
        assert_eq!(ids(&pipeline), vec!["1"]);
        assert_eq!(files(pipeline.store(), Stage::Process), 0);
        assert_eq!(files(pipeline.store(), Stage::Processed), 1);
    }

    #[test]
    fn test_locking_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path()).with_stage_locking(false);
        let pipeline = pipeline(&dir, config, String::new());
        pipeline
            .store()
            .save(Stage::Process, &item_xml("1"), Extension::Xml, true)
            .unwrap();

        let _held = pipeline.store().lock(Stage::Process).unwrap();
        assert!(pipeline.process().is_ok());
    }

    #[tokio::test]
    async fn test_status_and_events_follow_the_run() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(CollectingEventSink::new());
        let config = test_config(dir.path())
            .with_allowed_fetch_numbers(AllowSet::new([4]))
            .with_max_process_per_cycle(3);
        let pipeline = pipeline(&dir, config, feed_xml(4)).with_event_sink(sink.clone());

        pipeline.fetch().await.unwrap();
        pipeline.split().unwrap();
        pipeline.process().unwrap();

        let status = pipeline.status().unwrap();
        assert_eq!(status.files_in(Stage::Raw), 1);
        assert_eq!(status.files_in(Stage::Process), 1);
        assert_eq!(status.files_in(Stage::Processed), 3);
        assert_eq!(status.files_in(Stage::Results), 1);
        assert_eq!(status.result_records, 3);
        assert!(status.oldest_pending.is_some());

        assert_eq!(
            sink.event_types(),
            vec![
                "fetch.started",
                "fetch.source_stored",
                "fetch.completed",
                "split.completed",
                "process.completed",
            ]
        );
        let completed = sink.events_of_type("process.completed")[0].1.clone().unwrap();
        assert_eq!(completed["processed"], 3);
    }
}
