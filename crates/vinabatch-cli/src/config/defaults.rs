use vinabatch::core::models::job::RECEPTOR_EXTENSIONS;
use vinabatch::engine::config::{DEFAULT_BOX_SIZE, DEFAULT_LIGAND_EXTENSION, DEFAULT_RESERVE_CORES};

/// Environment variable naming the docking executable.
pub const EXECUTABLE_ENV_VAR: &str = "VINA_EXE";

pub struct DefaultsConfig {
    pub executable: String,
    pub num_modes: u32,
    pub box_size: f64,
    pub reserve_cores: usize,
    pub receptor_extensions: Vec<String>,
    pub ligand_extension: String,
    pub output_directory: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            executable: "vina".to_string(),
            num_modes: 9,
            box_size: DEFAULT_BOX_SIZE,
            reserve_cores: DEFAULT_RESERVE_CORES,
            receptor_extensions: RECEPTOR_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ligand_extension: DEFAULT_LIGAND_EXTENSION.to_string(),
            output_directory: ".".to_string(),
        }
    }
}
