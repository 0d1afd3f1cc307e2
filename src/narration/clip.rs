//! Recorded-clip playback through rodio.
//!
//! rodio's output stream is not `Send`, so a dedicated thread owns it and the
//! async side talks to it over a channel.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Sender},
        Arc, Mutex,
    },
    thread,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::oneshot;

use super::{player::NarrationPlayer, NarrationCategory};

const CLIP_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];
const CLIP_VOLUME: f32 = 0.8;

struct PlayRequest {
    path: PathBuf,
    volume: f32,
    done: oneshot::Sender<Result<()>>,
}

/// Plays `<clips_dir>/<category>.<ext>` for each narration.
pub struct ClipPlayer {
    clips_dir: PathBuf,
    tx: Arc<Mutex<Option<Sender<PlayRequest>>>>,
}

impl ClipPlayer {
    pub fn new(clips_dir: impl Into<PathBuf>) -> Self {
        Self {
            clips_dir: clips_dir.into(),
            tx: Arc::new(Mutex::new(None)),
        }
    }

    fn clip_path(&self, category: NarrationCategory) -> Option<PathBuf> {
        CLIP_EXTENSIONS
            .iter()
            .map(|ext| self.clips_dir.join(format!("{}.{ext}", category.as_str())))
            .find(|path| path.exists())
    }

    fn ensure_thread(&self) -> Result<Sender<PlayRequest>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|_| anyhow!("audio thread handle poisoned"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<PlayRequest>();

        thread::Builder::new()
            .name("narration-audio".to_string())
            .spawn(move || {
                let mut output: Option<(OutputStream, rodio::OutputStreamHandle)> = None;

                while let Ok(request) = rx.recv() {
                    let result = play_blocking(&mut output, &request.path, request.volume);
                    let _ = request.done.send(result);
                }
            })
            .context("failed to spawn narration audio thread")?;

        *guard = Some(tx.clone());
        Ok(tx)
    }
}

fn play_blocking(
    output: &mut Option<(OutputStream, rodio::OutputStreamHandle)>,
    path: &Path,
    volume: f32,
) -> Result<()> {
    if output.is_none() {
        *output = Some(
            OutputStream::try_default()
                .map_err(|e| anyhow!("failed to open audio output stream: {e}"))?,
        );
    }
    let Some((_, handle)) = output.as_ref() else {
        return Err(anyhow!("audio output stream unavailable"));
    };

    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("failed to decode {}", path.display()))?;
    let sink = Sink::try_new(handle).map_err(|e| anyhow!("failed to create audio sink: {e}"))?;

    sink.set_volume(volume);
    sink.append(source);
    sink.sleep_until_end();
    debug!("finished clip {}", path.display());
    Ok(())
}

#[async_trait]
impl NarrationPlayer for ClipPlayer {
    async fn play(&self, category: NarrationCategory, _text: &str) -> Result<()> {
        let Some(path) = self.clip_path(category) else {
            warn!(
                "no clip for {} in {}",
                category.as_str(),
                self.clips_dir.display()
            );
            return Ok(());
        };

        let tx = self.ensure_thread()?;
        let (done_tx, done_rx) = oneshot::channel();
        tx.send(PlayRequest {
            path,
            volume: CLIP_VOLUME,
            done: done_tx,
        })
        .map_err(|_| anyhow!("narration audio thread is gone"))?;

        done_rx
            .await
            .map_err(|_| anyhow!("narration audio thread dropped the request"))?
    }
}
