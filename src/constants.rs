pub const DEFAULT_IMAGE_PREFIX: &str = "coduno/fingerprint-";
pub const VOLUME_PREFIX: &str = "coduno-volume";
pub const CONTAINER_PREFIX: &str = "coduno-";

/// Where the workspace is bound inside the container.
pub const MOUNT_POINT: &str = "/run";

pub const PREPARE_LOG: &str = "prepare.log";
pub const STATS_LOG: &str = "stats.log";
pub const TEST_REPORT: &str = "build/test-results/TEST-com.coduno.TestApplication.xml";

pub const JAVA_MAIN_DIR: &str = "src/main/java";
pub const JAVA_MAIN_FILE: &str = "Application.java";
pub const JAVA_TEST_DIR: &str = "src/test/java";
pub const JAVA_TEST_FILE: &str = "TestApplication.java";

pub const DRAIN_CHUNK_SIZE: usize = 1024;
