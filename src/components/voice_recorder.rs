//! Voice Recorder Component
//!
//! Record, pause, resume and stop a voice note. Stopping, by hand or at
//! the time limit, uploads the take and hands the stored URL back to the
//! memory form.

use chrono::Utc;
use gloo_timers::callback::{Interval, Timeout};
use leptos::prelude::*;
use leptos::task::spawn_local;
use vault_core::forms::Notice;
use vault_core::recorder::{format_duration, upload_recording, RecorderError, RecorderState, Tick, VoiceRecorder};

use crate::components::notice_stack::show_notice;
use crate::context::use_app_context;
use crate::media::{open_microphone, MediaRecorderCapture};
use crate::store::use_app_store;

#[component]
pub fn VoiceRecorderPanel(#[prop(into)] on_recorded: Callback<String>) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_app_store();
    let max_secs = ctx.config().max_recording_secs;

    let recorder = StoredValue::new_local(VoiceRecorder::new(max_secs));
    let ticker = StoredValue::new_local(None::<Interval>);
    let (state, set_state) = signal(RecorderState::Idle);
    let (elapsed, set_elapsed) = signal(0u32);
    let (uploading, set_uploading) = signal(false);

    let (upload_failed, set_upload_failed) = signal(false);
    let (attached, set_attached) = signal(false);

    let upload = move || {
        let Some(recording) = recorder.try_with_value(|r| r.ready_to_upload().cloned()).flatten() else {
            return;
        };
        let backend = ctx.backend();
        set_uploading.set(true);
        set_upload_failed.set(false);
        spawn_local(async move {
            let response = upload_recording(backend.as_ref(), &recording, Utc::now()).await;
            set_uploading.set(false);
            match response.into_result() {
                Ok(url) => {
                    set_attached.set(true);
                    show_notice(store, Notice::success("Voice memory uploaded", "Your recording has been saved"));
                    on_recorded.run(url);
                }
                Err(err) => {
                    set_upload_failed.set(true);
                    show_notice(store, Notice::error("Upload failed", err));
                }
            }
        });
    };

    let stop = move || {
        ticker.try_update_value(|t| t.take());
        let finished = recorder.try_update_value(|r| r.stop().map(|rec| rec.duration_secs));
        if let Some(Err(err)) = finished {
            tracing::warn!(%err, "stop ignored");
        }
        set_state.set(RecorderState::Stopped);
    };

    let start = move |_| {
        spawn_local(async move {
            let stream = match open_microphone().await {
                Ok(stream) => stream,
                Err(err) => {
                    show_notice(store, Notice::error("Microphone unavailable", err.to_string()));
                    return;
                }
            };
            // the whole take arrives once the recorder has flushed after stop
            let capture = MediaRecorderCapture::new(stream, move |bytes| {
                // discarded or unmounted meanwhile
                if recorder.try_with_value(|r| r.state()) != Some(RecorderState::Stopped) {
                    return;
                }
                if bytes.is_empty() {
                    set_upload_failed.set(true);
                    show_notice(store, Notice::error("Recording failed", "Nothing was recorded"));
                    return;
                }
                recorder.try_update_value(|r| r.push_chunk(bytes));
                upload();
            });
            let started = capture.and_then(|capture| {
                recorder
                    .try_update_value(|r| r.start(Box::new(capture)))
                    .unwrap_or_else(|| Err(RecorderError::Microphone("recorder closed".into())))
            });
            if let Err(err) = started {
                show_notice(store, Notice::error("Recording failed", err.to_string()));
                return;
            }
            set_elapsed.set(0);
            set_attached.set(false);
            set_upload_failed.set(false);
            set_state.set(RecorderState::Recording);

            let interval = Interval::new(1_000, move || {
                match recorder.try_update_value(|r| r.tick()) {
                    Some(Tick::Continue(secs)) => set_elapsed.set(secs),
                    Some(Tick::LimitReached) => {
                        set_elapsed.set(max_secs);
                        // stop drops this interval, so leave its callback first
                        Timeout::new(0, stop).forget();
                    }
                    None => {}
                }
            });
            ticker.try_update_value(|t| *t = Some(interval));
        });
    };

    let pause = move |_| {
        if recorder.try_update_value(|r| r.pause()).map(|r| r.is_ok()).unwrap_or(false) {
            set_state.set(RecorderState::Paused);
        }
    };

    let resume = move |_| {
        if recorder.try_update_value(|r| r.resume()).map(|r| r.is_ok()).unwrap_or(false) {
            set_state.set(RecorderState::Recording);
        }
    };

    let discard = move |_| {
        recorder.try_update_value(|r| r.discard());
        set_elapsed.set(0);
        set_attached.set(false);
        set_upload_failed.set(false);
        set_state.set(RecorderState::Idle);
    };

    on_cleanup(move || {
        ticker.try_update_value(|t| t.take());
        recorder.try_update_value(|r| r.discard());
    });

    view! {
        <div class="voice-recorder">
            <span class="recorder-clock">
                {move || format!("{} / {}", format_duration(elapsed.get()), format_duration(max_secs))}
            </span>
            {move || match state.get() {
                RecorderState::Idle => view! {
                    <button type="button" class="record-btn" on:click=start>"● Record"</button>
                }.into_any(),
                RecorderState::Recording => view! {
                    <span class="recording-dot">"Recording"</span>
                    <button type="button" on:click=pause>"Pause"</button>
                    <button type="button" on:click=move |_| stop()>"Stop"</button>
                }.into_any(),
                RecorderState::Paused => view! {
                    <span class="recording-paused">"Paused"</span>
                    <button type="button" on:click=resume>"Resume"</button>
                    <button type="button" on:click=move |_| stop()>"Stop"</button>
                }.into_any(),
                RecorderState::Stopped => view! {
                    <span class="recording-status">
                        {move || if uploading.get() {
                            "Uploading..."
                        } else if attached.get() {
                            "✓ Voice note attached"
                        } else if upload_failed.get() {
                            "Upload failed"
                        } else {
                            "Finishing..."
                        }}
                    </span>
                    <Show when=move || upload_failed.get() && !uploading.get()>
                        <button type="button" class="primary-btn" on:click=move |_| upload()>"Retry upload"</button>
                    </Show>
                    <button type="button" disabled=move || uploading.get() on:click=discard>"Discard"</button>
                }.into_any(),
            }}
        </div>
    }
}
