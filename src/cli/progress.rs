use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Frames between spinner updates.
const UPDATE_INTERVAL: u64 = 4096;

/// Optional spinner counting decoded frames.
///
/// Without a [`MultiProgress`] every method is a no-op, so commands can
/// drive it unconditionally.
pub struct FrameProgress {
    pb: Option<ProgressBar>,
}

impl FrameProgress {
    pub fn new(multi: Option<&MultiProgress>, message: &str) -> Result<Self> {
        let pb = match multi {
            Some(multi) => {
                let pb = multi.add(ProgressBar::new_spinner());
                pb.set_style(ProgressStyle::with_template(
                    "{spinner:.green} {pos} frames\n{msg} | elapsed: {elapsed_precise}",
                )?);
                pb.enable_steady_tick(std::time::Duration::from_millis(100));
                pb.set_message(message.to_string());
                Some(pb)
            }
            None => None,
        };
        Ok(Self { pb })
    }

    pub fn update(&self, frames: u64) {
        if let Some(ref pb) = self.pb {
            if frames.is_multiple_of(UPDATE_INTERVAL) {
                pb.set_position(frames);
            }
        }
    }

    /// Runs `f` with the spinner hidden so it can print to the terminal.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        match self.pb {
            Some(ref pb) => pb.suspend(f),
            None => f(),
        }
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.pb {
            pb.finish_and_clear();
        }
    }
}

impl Drop for FrameProgress {
    fn drop(&mut self) {
        if let Some(ref pb) = self.pb {
            if !pb.is_finished() {
                pb.finish_and_clear();
            }
        }
    }
}
