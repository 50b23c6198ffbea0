use crate::batch::{ShadowMode, VERTEX_LIMIT};
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "BatchSettings::default_search_folders")]
    pub search_folders: Vec<String>,
    #[serde(default = "BatchSettings::default_name_filter")]
    pub name_filter: String,
    #[serde(default = "BatchSettings::default_vertex_limit")]
    pub vertex_limit: usize,
    #[serde(default)]
    pub prefixes: ResultPrefixes,
    #[serde(default = "BatchSettings::default_result_layer")]
    pub result_layer: u32,
    #[serde(default = "BatchSettings::default_reload_after_unpack")]
    pub reload_after_unpack: bool,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            search_folders: Self::default_search_folders(),
            name_filter: Self::default_name_filter(),
            vertex_limit: Self::default_vertex_limit(),
            prefixes: ResultPrefixes::default(),
            result_layer: Self::default_result_layer(),
            reload_after_unpack: Self::default_reload_after_unpack(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl BatchSettings {
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<BatchSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded batch settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default batch settings.",
                        path, err
                    );
                    BatchSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Batch settings file {:?} not found. Using default settings.",
                    path
                );
                BatchSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default batch settings.",
                    path, err
                );
                BatchSettings::default()
            }
        }
    }

    pub fn validate(mut self) -> Self {
        if self.vertex_limit == 0 || self.vertex_limit > VERTEX_LIMIT {
            warn!(
                "Vertex limit must be within 1..={}. Using {} instead.",
                VERTEX_LIMIT, VERTEX_LIMIT
            );
            self.vertex_limit = Self::default_vertex_limit();
        }

        if self.search_folders.is_empty() {
            warn!("No search folders configured. Using default folders.");
            self.search_folders = Self::default_search_folders();
        }

        let defaults = ResultPrefixes::default();
        for mode in ShadowMode::ALL {
            if self.prefixes.get(mode).is_empty() {
                warn!("Empty result prefix for {:?}. Using default prefix.", mode);
                *self.prefixes.get_mut(mode) = defaults.get(mode).to_string();
            }
        }

        self
    }

    fn default_search_folders() -> Vec<String> {
        vec!["Assets/Content".to_string()]
    }

    fn default_name_filter() -> String {
        "prefab_mesh_".to_string()
    }

    const fn default_vertex_limit() -> usize {
        VERTEX_LIMIT
    }

    const fn default_result_layer() -> u32 {
        9
    }

    const fn default_reload_after_unpack() -> bool {
        true
    }
}

/// Name prefixes of generated nodes, one per shadow class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultPrefixes {
    pub cast_and_receive: String,
    pub cast_only: String,
    pub no_cast: String,
}

impl ResultPrefixes {
    pub fn get(&self, mode: ShadowMode) -> &str {
        match mode {
            ShadowMode::CastAndReceive => &self.cast_and_receive,
            ShadowMode::CastOnly => &self.cast_only,
            ShadowMode::NoCast => &self.no_cast,
        }
    }

    fn get_mut(&mut self, mode: ShadowMode) -> &mut String {
        match mode {
            ShadowMode::CastAndReceive => &mut self.cast_and_receive,
            ShadowMode::CastOnly => &mut self.cast_only,
            ShadowMode::NoCast => &mut self.no_cast,
        }
    }
}

impl Default for ResultPrefixes {
    fn default() -> Self {
        Self {
            cast_and_receive: "CombinedMeshesShadows_".to_string(),
            cast_only: "CombinedMeshesShadowsOnly_".to_string(),
            no_cast: "CombinedMeshesNoShadows_".to_string(),
        }
    }
}

/// What a multi-unit run does when one unit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run and return the error
    #[default]
    Abort,
    /// Log the error, record the unit as failed and continue
    Skip,
}
