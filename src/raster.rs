//! SVG to PNG conversion through external tools.
//!
//! The SVG is piped to the tool's stdin and the PNG read from its stdout.
//! Tools are tried in order until one succeeds.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::banner::{HEIGHT, WIDTH};
use crate::error::{Error, Result};

/// Background used for the dark color scheme.
pub const DARK_BACKGROUND: &str = "#0d1117";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Color scheme hint passed to the rasterizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

/// A converter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub program: String,
    pub args: Vec<String>,
    /// Extra arguments for [`ColorScheme::Dark`], placed before `args`.
    pub dark_args: Vec<String>,
}

impl Tool {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            dark_args: Vec::new(),
        }
    }

    pub fn with_dark_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dark_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// `rsvg-convert -f png -w 1280 -h 640`
    pub fn rsvg_convert() -> Self {
        Self::new(
            "rsvg-convert",
            [
                "-f".to_string(),
                "png".to_string(),
                "-w".to_string(),
                WIDTH.to_string(),
                "-h".to_string(),
                HEIGHT.to_string(),
            ],
        )
        .with_dark_args(["-b", DARK_BACKGROUND])
    }

    /// ImageMagick `convert ... svg:- png:-`
    pub fn imagemagick() -> Self {
        Self::new(
            "convert",
            [
                "-density".to_string(),
                "96".to_string(),
                "-resize".to_string(),
                format!("{WIDTH}x{HEIGHT}"),
                "svg:-".to_string(),
                "png:-".to_string(),
            ],
        )
        .with_dark_args(["-background", DARK_BACKGROUND])
    }

    /// `inkscape --pipe --export-type=png`
    pub fn inkscape() -> Self {
        Self::new(
            "inkscape",
            [
                "--pipe".to_string(),
                "--export-type=png".to_string(),
                format!("--export-width={WIDTH}"),
                format!("--export-height={HEIGHT}"),
            ],
        )
        .with_dark_args([format!("--export-background={DARK_BACKGROUND}")])
    }

    /// Full argument list for a color scheme.
    pub fn command_args(&self, scheme: ColorScheme) -> Vec<String> {
        let mut args = Vec::new();
        match scheme {
            ColorScheme::Dark => args.extend(self.dark_args.iter().cloned()),
            // ImageMagick keeps transparency only when asked
            ColorScheme::Light if self.program == "convert" => {
                args.extend(["-background".to_string(), "none".to_string()])
            }
            ColorScheme::Light => {}
        }
        args.extend(self.args.iter().cloned());
        args
    }
}

/// Runs the first working tool with a per-run timeout.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    tools: Vec<Tool>,
    timeout: Duration,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl Rasterizer {
    /// rsvg-convert, then ImageMagick, then Inkscape.
    pub fn new(timeout: Duration) -> Self {
        Self::with_tools(
            vec![Tool::rsvg_convert(), Tool::imagemagick(), Tool::inkscape()],
            timeout,
        )
    }

    pub fn with_tools(tools: Vec<Tool>, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Convert SVG bytes to PNG bytes.
    ///
    /// A tool that cannot be started or exits unsuccessfully hands over to
    /// the next one. A timeout ends the conversion immediately.
    pub fn rasterize(&self, svg: &[u8], scheme: ColorScheme) -> Result<Vec<u8>> {
        for tool in &self.tools {
            match self.run(tool, svg, scheme) {
                Ok(png) => {
                    debug!(tool = %tool.program, bytes = png.len(), "rasterized banner");
                    return Ok(png);
                }
                Err(e @ Error::RasterizerTimeout(_)) => return Err(e),
                Err(e) => warn!(tool = %tool.program, error = %e, "rasterizer failed, trying next"),
            }
        }
        Err(Error::RasterizerUnavailable)
    }

    fn run(&self, tool: &Tool, svg: &[u8], scheme: ColorScheme) -> Result<Vec<u8>> {
        let mut child = Command::new(&tool.program)
            .args(tool.command_args(scheme))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::RasterizerFailed(format!("failed to spawn {}: {e}", tool.program)))?;

        let stdin = child.stdin.take();
        let input = svg.to_vec();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // The tool may exit before reading everything
                let _ = stdin.write_all(&input);
            }
        });
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match wait_with_deadline(&mut child, self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::RasterizerTimeout(self.timeout));
            }
        };

        let _ = writer.join();
        let png = stdout.join().unwrap_or_default();
        let errors = stderr.join().unwrap_or_default();

        if !status.success() {
            return Err(Error::RasterizerFailed(format!(
                "{} exited with {status}: {}",
                tool.program,
                String::from_utf8_lossy(&errors).trim()
            )));
        }
        if png.is_empty() {
            return Err(Error::RasterizerFailed(format!(
                "{} produced no output",
                tool.program
            )));
        }
        Ok(png)
    }
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut source) = source {
            let _ = source.read_to_end(&mut buf);
        }
        buf
    })
}

/// Poll until the child exits or `timeout` passes. `None` means timed out.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<std::process::ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
