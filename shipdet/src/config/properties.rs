use serde::{Deserialize, Serialize};

use super::{BaseProperties, PropertyHandler, PropertyOutcome, PropertyValue};
use crate::adapter::FilterConfig;
use crate::cluster::{BlobClusterer, Connectivity, ConnectedComponentsConfig, MeanShiftConfig, SdType};
use crate::error::ConfigError;
use crate::scale::ScaleFactor;
use crate::strategy::{
    CellAveragingCfar, CfarMethod, FilterKind, GlobalThreshold, ThresholdStrategy, WaveletAnomaly,
};

const NAMES: [&str; 14] = [
    "scale",
    "filter_type",
    "threshold",
    "guard_size",
    "neighbour_size",
    "cfar_threshold",
    "cfar_method",
    "wavelet_threshold",
    "spacing",
    "connectivity",
    "bandwidth",
    "rate",
    "max_iterations",
    "sd_type",
];

/// Raw, editable detection settings. Build the validated pipeline pieces with
/// [`DetectionProperties::filter_config`] and [`DetectionProperties::clusterer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionProperties {
    #[serde(flatten)]
    pub base: BaseProperties,
    pub scale: u32,
    pub filter_type: FilterKind,
    pub threshold: i64,
    pub guard_size: usize,
    pub neighbour_size: usize,
    pub cfar_threshold: f64,
    pub cfar_method: CfarMethod,
    pub wavelet_threshold: f64,
    pub spacing: usize,
    pub connectivity: Connectivity,
    pub bandwidth: f64,
    pub rate: f64,
    pub max_iterations: u32,
    pub sd_type: SdType,
}

impl Default for DetectionProperties {
    fn default() -> Self {
        Self {
            base: BaseProperties::default(),
            scale: 35,
            filter_type: FilterKind::Cfar,
            threshold: 0,
            guard_size: 5,
            neighbour_size: 7,
            cfar_threshold: 2.5,
            cfar_method: CfarMethod::Mask,
            wavelet_threshold: 3.0,
            spacing: 2,
            connectivity: Connectivity::Eight,
            bandwidth: 10.0,
            rate: 0.5,
            max_iterations: 1000,
            sd_type: SdType::ConnectedComponents,
        }
    }
}

impl DetectionProperties {
    pub fn strategy(&self) -> Result<ThresholdStrategy, ConfigError> {
        Ok(match self.filter_type {
            FilterKind::Global => GlobalThreshold::new(self.threshold)?.into(),
            FilterKind::Cfar => CellAveragingCfar::new(
                self.guard_size,
                self.neighbour_size,
                self.cfar_threshold,
                self.cfar_method,
            )?
            .into(),
            FilterKind::Wavelet => WaveletAnomaly::new(self.wavelet_threshold)?.into(),
            FilterKind::Scale => ThresholdStrategy::Scale,
        })
    }

    /// Validated per-tile filter settings.
    pub fn filter_config(&self) -> Result<FilterConfig, ConfigError> {
        let build = || -> Result<FilterConfig, ConfigError> {
            let mut config = FilterConfig::new(ScaleFactor::new(self.scale)?, self.strategy()?);
            config.enabled = self.base.enabled;
            Ok(config)
        };
        build().inspect_err(|err| tracing::warn!(%err, "Rejected filter configuration"))
    }

    /// Validated clusterer for the assembled mask.
    pub fn clusterer(&self) -> Result<BlobClusterer, ConfigError> {
        let clusterer = match self.sd_type {
            SdType::ConnectedComponents => Ok(BlobClusterer::from(ConnectedComponentsConfig {
                spacing: self.spacing,
                connectivity: self.connectivity,
            })),
            SdType::MeanShift => MeanShiftConfig::new(self.bandwidth, self.rate, self.max_iterations)
                .map(BlobClusterer::from),
        };
        clusterer.inspect_err(|err| tracing::warn!(%err, "Rejected clusterer configuration"))
    }
}

impl PropertyHandler for DetectionProperties {
    fn set_property(&mut self, name: &str, value: PropertyValue) -> Result<PropertyOutcome, ConfigError> {
        match name {
            "scale" => self.scale = value.as_unsigned("scale")?,
            "filter_type" => {
                self.filter_type = value.as_variant(
                    "filter_type",
                    &[
                        FilterKind::Global,
                        FilterKind::Cfar,
                        FilterKind::Wavelet,
                        FilterKind::Scale,
                    ],
                )?
            }
            "threshold" => self.threshold = value.as_int("threshold")?,
            "guard_size" => self.guard_size = value.as_unsigned("guard_size")?,
            "neighbour_size" => self.neighbour_size = value.as_unsigned("neighbour_size")?,
            "cfar_threshold" => self.cfar_threshold = value.as_real("cfar_threshold")?,
            "cfar_method" => {
                self.cfar_method =
                    value.as_variant("cfar_method", &[CfarMethod::Mask, CfarMethod::RunningSum])?
            }
            "wavelet_threshold" => self.wavelet_threshold = value.as_real("wavelet_threshold")?,
            "spacing" => self.spacing = value.as_unsigned("spacing")?,
            "connectivity" => {
                self.connectivity = value.as_variant(
                    "connectivity",
                    &[Connectivity::Four, Connectivity::Eight],
                )?
            }
            "bandwidth" => self.bandwidth = value.as_real("bandwidth")?,
            "rate" => self.rate = value.as_real("rate")?,
            "max_iterations" => self.max_iterations = value.as_unsigned("max_iterations")?,
            "sd_type" => {
                self.sd_type = value.as_variant(
                    "sd_type",
                    &[SdType::ConnectedComponents, SdType::MeanShift],
                )?
            }
            _ => return self.base.set_property(name, value),
        }
        Ok(PropertyOutcome::Handled)
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        let value = match name {
            "scale" => PropertyValue::Int(self.scale.into()),
            "filter_type" => PropertyValue::Text(self.filter_type.to_string()),
            "threshold" => PropertyValue::Int(self.threshold),
            "guard_size" => PropertyValue::Int(self.guard_size as i64),
            "neighbour_size" => PropertyValue::Int(self.neighbour_size as i64),
            "cfar_threshold" => PropertyValue::Real(self.cfar_threshold),
            "cfar_method" => PropertyValue::Text(self.cfar_method.to_string()),
            "wavelet_threshold" => PropertyValue::Real(self.wavelet_threshold),
            "spacing" => PropertyValue::Int(self.spacing as i64),
            "connectivity" => PropertyValue::Text(self.connectivity.to_string()),
            "bandwidth" => PropertyValue::Real(self.bandwidth),
            "rate" => PropertyValue::Real(self.rate),
            "max_iterations" => PropertyValue::Int(self.max_iterations.into()),
            "sd_type" => PropertyValue::Text(self.sd_type.to_string()),
            _ => return self.base.property(name),
        };
        Some(value)
    }

    fn property_names(&self) -> Vec<&'static str> {
        let mut names = self.base.property_names();
        names.extend(NAMES);
        names
    }
}
