//! Browser Media
//!
//! Microphone capture through `MediaRecorder` and byte access for picked
//! files. The recorder state machine itself lives in `vault_core::recorder`.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::task::spawn_local;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobEvent, File, MediaRecorder, MediaStream, MediaStreamConstraints, MediaStreamTrack};

use vault_core::forms::Attachment;
use vault_core::recorder::{AudioCapture, MicrophoneStream, RecorderError, StreamGuard};

fn js_message(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", err))
}

/// Read a whole blob into memory
pub async fn blob_bytes(blob: &Blob) -> Result<Vec<u8>, String> {
    let buffer = JsFuture::from(blob.array_buffer())
        .await
        .map_err(|e| js_message(&e))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// A picked file as a form attachment
pub async fn read_file(file: File) -> Result<Attachment, String> {
    let bytes = blob_bytes(&file).await?;
    let content_type = file.type_();
    Ok(Attachment {
        file_name: file.name(),
        content_type: (!content_type.is_empty()).then_some(content_type),
        bytes,
    })
}

/// A granted `getUserMedia` stream
pub struct MicStream(MediaStream);

impl MicrophoneStream for MicStream {
    fn stop_tracks(&self) {
        for track in self.0.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
    }
}

/// Ask for microphone access; the stream is guarded from here on
pub async fn open_microphone() -> Result<StreamGuard<MicStream>, RecorderError> {
    let window = web_sys::window().ok_or_else(|| RecorderError::Microphone("no window".into()))?;
    let devices = window
        .navigator()
        .media_devices()
        .map_err(|e| RecorderError::Microphone(js_message(&e)))?;
    let constraints = MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);
    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(|e| RecorderError::Microphone(js_message(&e)))?;
    let stream = JsFuture::from(promise)
        .await
        .map_err(|e| RecorderError::Microphone(js_message(&e)))?;
    let stream = stream
        .dyn_into::<MediaStream>()
        .map_err(|e| RecorderError::Microphone(js_message(&e)))?;
    Ok(StreamGuard::new(MicStream(stream)))
}

/// `MediaRecorder` over a microphone stream. Encoded chunks are kept as
/// blobs; once the recorder has flushed its last chunk after `release`,
/// the whole take is read and handed to `on_complete`.
pub struct MediaRecorderCapture {
    stream: StreamGuard<MicStream>,
    recorder: MediaRecorder,
    blobs: Rc<RefCell<Vec<Blob>>>,
    on_data: Option<Closure<dyn FnMut(BlobEvent)>>,
    on_complete: Option<Box<dyn FnOnce(Vec<u8>)>>,
}

impl MediaRecorderCapture {
    /// On error the guard is dropped here, which stops the stream's tracks
    pub fn new(
        stream: StreamGuard<MicStream>,
        on_complete: impl FnOnce(Vec<u8>) + 'static,
    ) -> Result<Self, RecorderError> {
        let recorder = MediaRecorder::new_with_media_stream(&stream.stream().0)
            .map_err(|e| RecorderError::Microphone(js_message(&e)))?;
        let blobs = Rc::new(RefCell::new(Vec::new()));
        let sink = blobs.clone();
        let on_data = Closure::<dyn FnMut(BlobEvent)>::new(move |ev: BlobEvent| {
            if let Some(blob) = ev.data() {
                sink.borrow_mut().push(blob);
            }
        });
        recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));
        Ok(Self {
            stream,
            recorder,
            blobs,
            on_data: Some(on_data),
            on_complete: Some(Box::new(on_complete)),
        })
    }
}

async fn read_take(blobs: &RefCell<Vec<Blob>>) -> Result<Vec<u8>, String> {
    let parts: js_sys::Array = blobs.borrow_mut().drain(..).collect();
    let take = Blob::new_with_blob_sequence(&parts).map_err(|e| js_message(&e))?;
    blob_bytes(&take).await
}

impl AudioCapture for MediaRecorderCapture {
    fn start(&mut self, timeslice_ms: u32) -> Result<(), RecorderError> {
        self.recorder
            .start_with_time_slice(timeslice_ms as i32)
            .map_err(|e| RecorderError::Microphone(js_message(&e)))
    }

    fn pause(&mut self) {
        if let Err(err) = self.recorder.pause() {
            tracing::warn!(err = %js_message(&err), "MediaRecorder pause failed");
        }
    }

    fn resume(&mut self) {
        if let Err(err) = self.recorder.resume() {
            tracing::warn!(err = %js_message(&err), "MediaRecorder resume failed");
        }
    }

    fn release(&mut self) {
        let on_data = self.on_data.take();
        let on_complete = self.on_complete.take();
        match self.recorder.stop() {
            Ok(()) => {
                // the last chunk arrives before `stop`, so keep the handler until then
                let recorder = self.recorder.clone();
                let blobs = self.blobs.clone();
                let on_stop = Closure::once_into_js(move || {
                    recorder.set_ondataavailable(None);
                    drop(on_data);
                    spawn_local(async move {
                        match read_take(&blobs).await {
                            Ok(bytes) => {
                                if let Some(on_complete) = on_complete {
                                    on_complete(bytes);
                                }
                            }
                            Err(err) => tracing::warn!(%err, "could not read recorded audio"),
                        }
                    });
                });
                self.recorder.set_onstop(Some(on_stop.unchecked_ref()));
            }
            // never started
            Err(_) => self.recorder.set_ondataavailable(None),
        }
        self.stream.stop();
    }

    fn content_type(&self) -> String {
        let mime = self.recorder.mime_type();
        if mime.is_empty() {
            "audio/webm".to_string()
        } else {
            mime
        }
    }
}
