//! Realtime Socket
//!
//! Browser WebSocket transport for thread change feeds. Each subscription
//! gets its own socket: join on open, heartbeat while alive, leave and
//! close when the feed is released.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Interval;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use vault_core::domain::Table;
use vault_core::realtime::protocol::{
    channel_topic, decode_change, heartbeat_frame, join_frame, leave_frame, Frame, HEARTBEAT_INTERVAL_MS,
};
use vault_core::repository::{ChangeFeed, ChangeSender, ChangeSource, Filter};
use vault_core::{BackendError, BackendResult};

pub struct SocketChangeSource {
    url: String,
    next_ref: Rc<Cell<u64>>,
}

impl SocketChangeSource {
    pub fn new(url: String) -> Self {
        Self {
            url,
            next_ref: Rc::new(Cell::new(1)),
        }
    }
}

fn take_ref(counter: &Cell<u64>) -> u64 {
    let reference = counter.get();
    counter.set(reference + 1);
    reference
}

/// Everything a live socket keeps alive; dropped on release
struct SocketHandlers {
    _on_open: Closure<dyn FnMut()>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
    _heartbeat: Interval,
}

impl ChangeSource for SocketChangeSource {
    fn subscribe(&self, table: Table, filter: &Filter, access_token: Option<String>) -> BackendResult<ChangeFeed> {
        let socket = WebSocket::new(&self.url)
            .map_err(|err| BackendError::Unavailable(format!("realtime socket: {:?}", err)))?;
        let topic = channel_topic(table, filter);
        let (tx, feed) = ChangeFeed::channel();
        // cleared when the server closes the socket so the feed ends
        let sender: Rc<RefCell<Option<ChangeSender>>> = Rc::new(RefCell::new(Some(tx)));

        let join = join_frame(&topic, table, filter, access_token.as_deref(), take_ref(&self.next_ref)).encode()?;
        let on_open = {
            let socket = socket.clone();
            let topic = topic.clone();
            Closure::<dyn FnMut()>::new(move || {
                tracing::debug!(%topic, "realtime socket open, joining");
                if let Err(err) = socket.send_with_str(&join) {
                    tracing::warn!(?err, "realtime join failed");
                }
            })
        };
        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_message = {
            let sender = sender.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
                let Some(text) = ev.data().as_string() else {
                    return;
                };
                let frame = match Frame::decode(&text) {
                    Ok(frame) => frame,
                    Err(err) => {
                        tracing::warn!(%err, "undecodable realtime frame");
                        return;
                    }
                };
                if frame.reply_status() == Some("error") {
                    tracing::warn!(topic = %frame.topic, payload = %frame.payload, "realtime channel error");
                }
                match decode_change(&frame) {
                    Ok(Some(event)) => {
                        if let Some(tx) = sender.borrow().as_ref() {
                            let _ = tx.send(event);
                        }
                    }
                    Ok(None) => {}
                    Err(err) => tracing::warn!(%err, "bad change payload"),
                }
            })
        };
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_close = {
            let sender = sender.clone();
            Closure::<dyn FnMut(CloseEvent)>::new(move |ev: CloseEvent| {
                tracing::debug!(code = ev.code(), reason = %ev.reason(), "realtime socket closed");
                sender.borrow_mut().take();
            })
        };
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        let heartbeat = {
            let socket = socket.clone();
            let next_ref = self.next_ref.clone();
            Interval::new(HEARTBEAT_INTERVAL_MS, move || {
                if socket.ready_state() != WebSocket::OPEN {
                    return;
                }
                match heartbeat_frame(take_ref(&next_ref)).encode() {
                    Ok(text) => {
                        let _ = socket.send_with_str(&text);
                    }
                    Err(err) => tracing::warn!(%err, "heartbeat encode failed"),
                }
            })
        };

        let handlers = SocketHandlers {
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
            _heartbeat: heartbeat,
        };
        let leave = leave_frame(&topic, take_ref(&self.next_ref)).encode()?;

        Ok(feed.on_close(move || {
            if socket.ready_state() == WebSocket::OPEN {
                let _ = socket.send_with_str(&leave);
            }
            socket.set_onopen(None);
            socket.set_onmessage(None);
            socket.set_onclose(None);
            let _ = socket.close();
            sender.borrow_mut().take();
            drop(handlers);
            tracing::debug!(%topic, "realtime subscription released");
        }))
    }
}
