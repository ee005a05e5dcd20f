//! GStreamer pipeline for looping animation clips.

use std::path::Path;

use gio::prelude::*;
use gstreamer as gst;
use gstreamer::prelude::*;
use gtk4 as gtk;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("GStreamer error: {0}")]
    Gstreamer(#[from] glib::Error),
    #[error("GStreamer bool error: {0}")]
    GstreamerBool(#[from] glib::BoolError),
    #[error("Failed to create element: {0}")]
    ElementCreation(String),
    #[error("Pipeline has no bus")]
    NoBus,
    #[error("Video file not found: {0}")]
    MissingFile(String),
    #[error("State change failed")]
    StateChange,
}

/// Fullscreen video player: `playbin` rendering into a GTK paintable
pub struct VideoPipeline {
    playbin: gst::Element,
    paintable: gtk::gdk::Paintable,
    _bus_watch: gst::bus::BusWatchGuard,
}

impl VideoPipeline {
    /// Create the player; nothing plays until [`play_file`](Self::play_file)
    pub fn new() -> Result<Self, PipelineError> {
        gst::init()?;
        gstgtk4::plugin_register_static()?;

        // GTK4 paintable sink
        let sink = gst::ElementFactory::make("gtk4paintablesink")
            .build()
            .map_err(|_| PipelineError::ElementCreation("gtk4paintablesink".into()))?;

        let paintable = sink.property::<gtk::gdk::Paintable>("paintable");

        // Ambient clips are silent
        let playbin = gst::ElementFactory::make("playbin")
            .property("video-sink", &sink)
            .property("mute", true)
            .build()
            .map_err(|_| PipelineError::ElementCreation("playbin".into()))?;

        let bus = playbin.bus().ok_or(PipelineError::NoBus)?;
        let playbin_weak = playbin.downgrade();
        let bus_watch = bus.add_watch_local(move |_bus, msg| {
            match msg.view() {
                gst::MessageView::Eos(_) => {
                    // Loop from the first frame
                    if let Some(playbin) = playbin_weak.upgrade() {
                        if let Err(e) = playbin.seek_simple(
                            gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
                            gst::ClockTime::ZERO,
                        ) {
                            log::warn!("Failed to rewind video: {}", e);
                        }
                    }
                }
                gst::MessageView::Error(err) => {
                    log::error!(
                        "Video error from {:?}: {} ({:?})",
                        err.src().map(|s| s.path_string()),
                        err.error(),
                        err.debug()
                    );
                }
                _ => {}
            }
            glib::ControlFlow::Continue
        })?;

        Ok(Self {
            playbin,
            paintable,
            _bus_watch: bus_watch,
        })
    }

    /// Get the paintable for use in GTK widgets
    pub fn paintable(&self) -> &gtk::gdk::Paintable {
        &self.paintable
    }

    /// Stop whatever is playing and start `path` from its first frame
    pub fn play_file(&self, path: &str) -> Result<(), PipelineError> {
        if !Path::new(path).exists() {
            return Err(PipelineError::MissingFile(path.to_string()));
        }

        log::info!("Changing video to: {}", path);
        self.stop()?;

        let uri = gio::File::for_path(path).uri();
        self.playbin.set_property("uri", uri.as_str());
        self.playbin
            .set_state(gst::State::Playing)
            .map_err(|_| PipelineError::StateChange)?;
        Ok(())
    }

    /// Stop the pipeline, dropping any buffered frames
    pub fn stop(&self) -> Result<(), PipelineError> {
        self.playbin
            .set_state(gst::State::Null)
            .map_err(|_| PipelineError::StateChange)?;
        Ok(())
    }
}

impl Drop for VideoPipeline {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
