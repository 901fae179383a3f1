use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::ocr::TextExtractor;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Runs the `tesseract` executable, feeding the image on stdin
pub struct TesseractCli {
    command: String,
    languages: String,
    oem: u8,
    psm: u8,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            languages: config.languages.clone(),
            oem: config.oem,
            psm: config.psm,
        }
    }

    /// Arguments after the executable name
    pub fn args(&self) -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.languages.clone(),
            "--oem".to_string(),
            self.oem.to_string(),
            "--psm".to_string(),
            self.psm.to_string(),
        ]
    }

    fn spawn_error(&self, e: std::io::Error) -> OcrError {
        if e.kind() == ErrorKind::NotFound {
            OcrError::Unavailable(format!("{} is not installed", self.command))
        } else {
            OcrError::Failed(format!("failed to execute {}: {}", self.command, e))
        }
    }
}

#[async_trait]
impl TextExtractor for TesseractCli {
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut child = Command::new(&self.command)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image)
                .await
                .map_err(|e| OcrError::Failed(format!("failed to pass image: {}", e)))?;
            // Closing stdin lets the engine start
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrError::Failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            ::log::error!("Tesseract failed: {}", stderr.trim());
            return Err(OcrError::Failed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn is_available(&self) -> bool {
        match Command::new(&self.command).arg("--version").output().await {
            Ok(output) => output.status.success(),
            Err(e) => {
                ::log::debug!("{} --version failed: {}", self.command, e);
                false
            }
        }
    }
}
