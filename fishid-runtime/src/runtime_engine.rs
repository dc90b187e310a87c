use std::path::PathBuf;
use std::sync::Arc;

use fishid_camera::{CameraAdapter, ImageFileBackend, VideoBackend};
use fishid_core::config::SessionConfig;
use fishid_engine::controller::SessionController;
use fishid_engine::traits::CaptureDevice;

use crate::classifier::HttpClassifier;

/// Wires a controller to the HTTP classifier and the given video source.
///
/// Returns the classifier too, so callers can reuse its client for facts lookups.
pub fn build_controller(
    cfg: SessionConfig,
    backend: Arc<dyn VideoBackend>,
) -> anyhow::Result<(SessionController, Arc<HttpClassifier>)> {
    let classifier = Arc::new(HttpClassifier::from_config(&cfg)?);
    let camera: Arc<dyn CaptureDevice> = Arc::new(CameraAdapter::new(backend, cfg.jpeg_quality));
    log::info!("classifying via {}", classifier.classify_url());

    let controller = SessionController::new(cfg, camera, classifier.clone());
    Ok((controller, classifier))
}

/// Same as `build_controller`, with a still image file standing in for the camera.
pub fn build_file_controller(
    cfg: SessionConfig,
    image: impl Into<PathBuf>,
) -> anyhow::Result<(SessionController, Arc<HttpClassifier>)> {
    build_controller(cfg, Arc::new(ImageFileBackend::new(image)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishid_camera::SyntheticBackend;
    use fishid_engine::session::SessionStatus;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn synthetic_camera_session_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "description": "{\"fish_type\":\"Carp\",\"habitat\":\"Ponds\"}"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = SyntheticBackend::new(32, 24);
        let counters = backend.counters();
        let cfg = SessionConfig {
            base_url: server.uri(),
            ..Default::default()
        };
        let (controller, _) = build_controller(cfg, Arc::new(backend)).unwrap();

        controller.start_camera().await.unwrap();
        let still = controller.capture().unwrap();
        assert_eq!((still.width(), still.height()), (32, 24));

        let result = controller.submit().await.unwrap();
        assert_eq!(result.fish_type, "Carp");
        assert_eq!(result.habitat, "Ponds");
        assert_eq!(result.edibility, "Unknown");
        assert_eq!(controller.status(), SessionStatus::Succeeded);
        assert_eq!(counters.live(), 0);
    }

    #[tokio::test]
    async fn image_file_stands_in_for_the_camera() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("catch.png");
        std::fs::write(&img, b"not really a png").unwrap();

        let (controller, _) = build_file_controller(SessionConfig::default(), &img).unwrap();
        let err = controller.start_camera().await.unwrap_err();
        assert_eq!(err.kind(), Some(fishid_engine::error::ErrorKind::DeviceUnavailable));
        assert_eq!(controller.status(), SessionStatus::Idle);
    }
}
