// Pipeline state machine tests against a scripted backend.

mod test_utils;

use reelsmith_core::{ProjectState, SegmentKind, Stage};
use reelsmith_error::{PipelineErrorKind, ReelsmithErrorKind};
use reelsmith_pipeline::{Pipeline, PipelineSettings};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use test_utils::{
    MockBackend, TEST_IMAGE, done_empty, done_failed, done_with, fast_poll, pending, segment,
};
use tokio::sync::Notify;

fn pipeline_with(backend: &Arc<MockBackend>) -> Pipeline {
    Pipeline::new(backend.clone(), PipelineSettings::default(), fast_poll())
}

async fn at_visual_dev(backend: &Arc<MockBackend>) -> anyhow::Result<Pipeline> {
    let pipeline = pipeline_with(backend);
    pipeline.set_raw_input("Mara keeps the lighthouse on a storm-swept coast.");
    pipeline.analyze().await?;
    pipeline.extract_characters().await?;
    pipeline.advance_to_visual_dev().await?;
    Ok(pipeline)
}

#[tokio::test]
async fn full_pipeline_reaches_complete() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let pipeline = at_visual_dev(&backend).await?;

    pipeline.generate_character_image("c1").await?;
    pipeline.generate_video().await?;

    let state = pipeline.snapshot();
    assert_eq!(state.current_stage, Stage::Complete);
    assert!(!state.is_processing);
    assert_eq!(
        state.generated_video_url.as_deref(),
        Some("https://video.example/clip.mp4?key=test")
    );
    assert_eq!(state.script.len(), 3);
    assert_eq!(state.characters.len(), 2);
    assert_eq!(MockBackend::count(&backend.poll_calls), 2);

    let request = backend.last_video_request.lock().unwrap().clone().unwrap();
    assert_eq!(
        request.prompt,
        "Cinematic shot. A lighthouse at dusk shot. Featuring a character looking like: portrait of Mara"
    );
    assert_eq!(request.image.as_deref(), Some("data:image/png;base64,IMG1"));
    Ok(())
}

#[tokio::test]
async fn analyze_failure_keeps_input_stage() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend {
        fail_analysis: true,
        ..Default::default()
    });
    let pipeline = pipeline_with(&backend);
    pipeline.set_raw_input("An idea");

    let err = pipeline.analyze().await.unwrap_err();
    assert!(err.is_backend_failure());

    let state = pipeline.snapshot();
    assert_eq!(state.current_stage, Stage::Input);
    assert!(!state.is_processing);
    assert!(state.last_error.is_some());
    assert!(state.script.is_empty());
    Ok(())
}

#[tokio::test]
async fn analyze_rejects_blank_input_without_backend_call() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let pipeline = pipeline_with(&backend);
    pipeline.set_raw_input("   \n\t");

    let err = pipeline.analyze().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(backend.total_calls(), 0);
    assert_eq!(pipeline.snapshot().current_stage, Stage::Input);
    Ok(())
}

#[tokio::test]
async fn analyze_truncates_long_input() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let settings = PipelineSettings::builder()
        .analysis_char_limit(10_usize)
        .build()?;
    let pipeline = Pipeline::new(backend.clone(), settings, fast_poll());
    pipeline.set_raw_input("é".repeat(50));

    pipeline.analyze().await?;

    let sent = backend.last_analysis_text.lock().unwrap().clone().unwrap();
    assert_eq!(sent.chars().count(), 10);
    assert_eq!(pipeline.snapshot().raw_input.chars().count(), 50);
    Ok(())
}

#[tokio::test]
async fn extraction_is_bounded_by_char_limit() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let settings = PipelineSettings::builder()
        .extraction_char_limit(25_usize)
        .build()?;
    let pipeline = Pipeline::new(backend.clone(), settings, fast_poll());
    pipeline.set_raw_input("story");
    pipeline.analyze().await?;
    pipeline.extract_characters().await?;

    let sent = backend.last_extraction.lock().unwrap().clone();
    let joined = sent
        .iter()
        .map(|s| s.content().as_str())
        .collect::<Vec<_>>()
        .join("\n");
    assert_eq!(joined.chars().count(), 25);
    assert_eq!(sent[0].content(), "A lighthouse at dusk");
    assert_eq!(sent[1].content(), "Who ");
    Ok(())
}

#[tokio::test]
async fn extraction_failure_keeps_analysis_stage() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend {
        fail_extraction: true,
        ..Default::default()
    });
    let pipeline = pipeline_with(&backend);
    pipeline.set_raw_input("story");
    pipeline.analyze().await?;

    assert!(pipeline.extract_characters().await.is_err());

    let state = pipeline.snapshot();
    assert_eq!(state.current_stage, Stage::Analysis);
    assert!(!state.is_processing);
    assert!(state.characters.is_empty());
    assert!(state.last_error.is_some());
    Ok(())
}

#[tokio::test]
async fn out_of_order_operation_is_an_illegal_transition() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let pipeline = pipeline_with(&backend);

    let err = pipeline.extract_characters().await.unwrap_err();
    match err.kind() {
        ReelsmithErrorKind::Pipeline(e) => {
            assert!(matches!(e.kind, PipelineErrorKind::IllegalTransition { .. }))
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(pipeline.advance_to_visual_dev().await.is_err());
    assert!(pipeline.generate_video().await.is_err());
    assert_eq!(backend.total_calls(), 0);
    assert_eq!(pipeline.snapshot().current_stage, Stage::Input);
    Ok(())
}

#[tokio::test]
async fn unknown_character_id_is_a_no_op() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let pipeline = at_visual_dev(&backend).await?;
    let before = pipeline.snapshot();

    pipeline.generate_character_image("nobody").await?;

    assert_eq!(*pipeline.snapshot(), *before);
    assert_eq!(MockBackend::count(&backend.image_calls), 0);
    Ok(())
}

#[tokio::test]
async fn regenerating_an_image_replaces_only_that_character() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let pipeline = at_visual_dev(&backend).await?;

    pipeline.generate_character_image("c2").await?;
    pipeline.generate_character_image("c2").await?;

    let state = pipeline.snapshot();
    let matching: Vec<_> = state.characters.iter().filter(|c| c.id() == "c2").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(
        matching[0].image_url().as_deref(),
        Some("data:image/png;base64,IMG2")
    );
    assert!(state.character("c1").unwrap().image_url().is_none());

    let prompt = backend.last_image_prompt.lock().unwrap().clone().unwrap();
    assert_eq!(
        prompt,
        "Character Concept Art, high quality, detailed, white background. portrait of Tomas"
    );
    Ok(())
}

#[tokio::test]
async fn image_failure_leaves_character_unchanged() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend {
        fail_images: true,
        ..Default::default()
    });
    let pipeline = at_visual_dev(&backend).await?;

    assert!(pipeline.generate_character_image("c1").await.is_err());

    let state = pipeline.snapshot();
    assert!(state.character("c1").unwrap().image_url().is_none());
    assert!(state.last_error.is_some());
    assert!(!state.is_processing);
    assert_eq!(state.current_stage, Stage::VisualDev);
    Ok(())
}

#[tokio::test]
async fn video_without_characters_makes_no_backend_call() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend {
        characters: Vec::new(),
        ..Default::default()
    });
    let pipeline = at_visual_dev(&backend).await?;

    let err = pipeline.generate_video().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(MockBackend::count(&backend.start_calls), 0);
    assert_eq!(pipeline.snapshot().current_stage, Stage::VisualDev);
    Ok(())
}

#[tokio::test]
async fn video_without_visual_segment_makes_no_backend_call() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend {
        segments: vec![segment("d1", SegmentKind::Dialogue, "Hello?")],
        ..Default::default()
    });
    let pipeline = at_visual_dev(&backend).await?;

    let err = pipeline.generate_video().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(MockBackend::count(&backend.start_calls), 0);
    Ok(())
}

#[tokio::test]
async fn failed_video_reverts_to_input() -> anyhow::Result<()> {
    let backend = Arc::new(
        MockBackend::default().with_video_ops(vec![pending(), done_failed("safety filter")]),
    );
    let pipeline = at_visual_dev(&backend).await?;

    assert!(pipeline.generate_video().await.is_err());

    let state = pipeline.snapshot();
    assert_eq!(state.current_stage, Stage::Input);
    assert!(!state.is_processing);
    assert!(state.generated_video_url.is_none());
    assert!(state.last_error.as_deref().unwrap_or_default().contains("safety filter"));
    Ok(())
}

#[tokio::test]
async fn video_generation_publishes_progress_before_backend_call() -> anyhow::Result<()> {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(MockBackend {
        video_gate: Some(gate.clone()),
        ..Default::default()
    });
    let pipeline = Arc::new(at_visual_dev(&backend).await?);

    let running = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.generate_video().await })
    };
    let observed = pipeline
        .subscribe()
        .wait_for(|s| s.current_stage == Stage::VideoGen && s.is_processing)
        .await?
        .clone();
    assert_eq!(MockBackend::count(&backend.start_calls), 0);
    assert!(observed.last_error.is_none());
    assert!(observed.generated_video_url.is_none());

    gate.notify_one();
    running.await??;

    let state = pipeline.snapshot();
    assert_eq!(state.current_stage, Stage::Complete);
    assert!(!state.is_processing);
    Ok(())
}

#[tokio::test]
async fn video_without_result_reverts_to_input() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default().with_video_ops(vec![done_empty()]));
    let pipeline = at_visual_dev(&backend).await?;

    assert!(pipeline.generate_video().await.is_err());
    assert_eq!(pipeline.snapshot().current_stage, Stage::Input);
    assert_eq!(MockBackend::count(&backend.poll_calls), 0);
    Ok(())
}

#[tokio::test]
async fn direct_video_uses_default_prompt() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let pipeline = pipeline_with(&backend);

    pipeline
        .generate_video_direct(TEST_IMAGE.to_string(), Some("   ".to_string()))
        .await?;

    let state = pipeline.snapshot();
    assert_eq!(state.current_stage, Stage::Complete);
    assert_eq!(state.uploaded_image.as_deref(), Some(TEST_IMAGE));
    assert!(state.video_prompt.is_none());

    let request = backend.last_video_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.prompt, "Cinematic movement, high quality");
    assert_eq!(request.image.as_deref(), Some(TEST_IMAGE));
    Ok(())
}

#[tokio::test]
async fn failed_direct_video_reverts_to_input() -> anyhow::Result<()> {
    let backend = Arc::new(
        MockBackend::default().with_video_ops(vec![pending(), done_failed("quota exhausted")]),
    );
    let pipeline = pipeline_with(&backend);

    let err = pipeline
        .generate_video_direct(TEST_IMAGE.to_string(), Some("slow pan".to_string()))
        .await
        .unwrap_err();
    assert!(err.is_backend_failure());

    let state = pipeline.snapshot();
    assert_eq!(state.current_stage, Stage::Input);
    assert!(!state.is_processing);
    assert!(state.generated_video_url.is_none());
    assert!(state.last_error.as_deref().unwrap_or_default().contains("quota exhausted"));
    assert_eq!(MockBackend::count(&backend.poll_calls), 1);
    Ok(())
}

#[tokio::test]
async fn direct_video_rejects_missing_image() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let pipeline = pipeline_with(&backend);

    let err = pipeline
        .generate_video_direct(String::new(), Some("pan left".to_string()))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(backend.total_calls(), 0);
    assert_eq!(pipeline.snapshot().current_stage, Stage::Input);
    Ok(())
}

#[tokio::test]
async fn reset_returns_to_initial_state() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let pipeline = at_visual_dev(&backend).await?;
    pipeline.select_model(2)?;
    pipeline.generate_video().await?;

    pipeline.reset();

    assert_eq!(*pipeline.snapshot(), ProjectState::default());
    Ok(())
}

#[tokio::test]
async fn second_operation_while_in_flight_is_rejected() -> anyhow::Result<()> {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(MockBackend {
        gate: Some(gate.clone()),
        ..Default::default()
    });
    let pipeline = Arc::new(pipeline_with(&backend));
    pipeline.set_raw_input("story");

    let running = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.analyze().await })
    };
    pipeline.subscribe().wait_for(|s| s.is_processing).await?;
    let before = pipeline.snapshot();

    let err = pipeline.analyze().await.unwrap_err();
    assert!(err.is_already_in_progress());
    assert!(pipeline.generate_video_direct(TEST_IMAGE.to_string(), None).await.is_err());
    assert_eq!(*pipeline.snapshot(), *before);
    assert_eq!(MockBackend::count(&backend.analyze_calls), 1);

    gate.notify_one();
    running.await??;
    assert_eq!(pipeline.snapshot().current_stage, Stage::Analysis);
    assert!(!pipeline.snapshot().is_processing);
    Ok(())
}

#[tokio::test]
async fn dropped_operation_clears_processing_flag() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend {
        gate: Some(Arc::new(Notify::new())),
        ..Default::default()
    });
    let pipeline = pipeline_with(&backend);
    pipeline.set_raw_input("story");

    let outcome = tokio::time::timeout(Duration::from_millis(20), pipeline.analyze()).await;
    assert!(outcome.is_err());

    let state = pipeline.snapshot();
    assert!(!state.is_processing);
    assert_eq!(state.current_stage, Stage::Input);

    let err = pipeline.advance_to_visual_dev().await.unwrap_err();
    assert!(!err.is_already_in_progress());
    Ok(())
}

#[tokio::test]
async fn reset_during_poll_discards_late_result() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default().with_video_ops(vec![pending()]));
    let pipeline = Arc::new(at_visual_dev(&backend).await?);

    let running = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.generate_video().await })
    };
    while MockBackend::count(&backend.poll_calls) == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    pipeline.reset();
    let err = running.await?.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(*pipeline.snapshot(), ProjectState::default());
    Ok(())
}

#[tokio::test]
async fn operation_started_right_after_reset_is_accepted() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default().with_video_ops(vec![pending()]));
    let pipeline = Arc::new(at_visual_dev(&backend).await?);

    let running = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.generate_video().await })
    };
    while MockBackend::count(&backend.poll_calls) == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    pipeline.reset();
    *backend.video_ops.lock().unwrap() =
        VecDeque::from(vec![done_with("https://cdn.example/direct.mp4")]);
    let state = pipeline.snapshot();
    assert!(!state.is_processing);
    assert_eq!(state.current_stage, Stage::Input);

    pipeline
        .generate_video_direct(TEST_IMAGE.to_string(), None)
        .await?;

    let state = pipeline.snapshot();
    assert_eq!(state.current_stage, Stage::Complete);
    assert_eq!(
        state.generated_video_url.as_deref(),
        Some("https://cdn.example/direct.mp4?key=test")
    );
    assert!(running.await?.unwrap_err().is_cancelled());
    Ok(())
}

#[tokio::test]
async fn cancel_during_poll_reverts_to_input() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default().with_video_ops(vec![pending()]));
    let pipeline = Arc::new(at_visual_dev(&backend).await?);

    let running = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.generate_video().await })
    };
    pipeline.subscribe().wait_for(|s| s.is_processing).await?;

    pipeline.cancel();
    let err = running.await?.unwrap_err();
    assert!(err.is_cancelled());

    let state = pipeline.snapshot();
    assert_eq!(state.current_stage, Stage::Input);
    assert!(!state.is_processing);
    assert_eq!(state.characters.len(), 2);
    Ok(())
}

#[tokio::test]
async fn select_model_validates_against_catalogue() -> anyhow::Result<()> {
    let backend = Arc::new(MockBackend::default());
    let pipeline = pipeline_with(&backend);

    assert!(pipeline.select_model(99).unwrap_err().is_validation());
    assert_eq!(pipeline.snapshot().selected_model_id, 8);

    pipeline.select_model(9)?;
    assert_eq!(pipeline.snapshot().selected_model_id, 9);
    Ok(())
}
