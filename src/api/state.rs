use std::sync::Arc;

use crate::carrier::{self, CarrierClient};
use crate::core::AppConfig;
use crate::generators::DocumentPipeline;
use crate::pdf::{ChromeRenderer, TableRenderer};

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<AppConfig>,
    pub carrier: Arc<dyn CarrierClient>,
    pub pipeline: Arc<DocumentPipeline>,
}

impl ApiState {
    /// Wires the carrier selected by `CARRIER_MODE` and the Chrome table renderer.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let carrier = carrier::from_config(&config.carrier)?;
        let renderer: Arc<dyn TableRenderer> = Arc::new(ChromeRenderer::new(&config.render));
        Ok(Self::with_parts(config, carrier, renderer))
    }

    pub fn with_parts(
        config: Arc<AppConfig>,
        carrier: Arc<dyn CarrierClient>,
        renderer: Arc<dyn TableRenderer>,
    ) -> Self {
        let pipeline = Arc::new(DocumentPipeline::new(config.clone(), carrier.clone(), renderer));
        ApiState {
            config,
            carrier,
            pipeline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::MockCarrier;
    use crate::core::RenderConfig;

    #[test]
    fn parts_share_the_given_config() {
        let config = Arc::new(AppConfig {
            max_json_bytes: 4096,
            ..Default::default()
        });
        let renderer = Arc::new(ChromeRenderer::new(&RenderConfig::default()));
        let state = ApiState::with_parts(config.clone(), Arc::new(MockCarrier::new()), renderer);

        assert!(Arc::ptr_eq(&state.config, &config));
        assert_eq!(state.config.max_json_bytes, 4096);
    }
}
