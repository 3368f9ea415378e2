//! Application Context
//!
//! Shared state provided via Leptos Context API.

use std::rc::Rc;

use leptos::prelude::*;
use vault_core::{Backend, ClientConfig, InMemoryBackend, Session, SessionState, SupabaseBackend};

use crate::realtime_socket::SocketChangeSource;

/// App-wide handles provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Data backend every page talks to
    backend: StoredValue<Rc<dyn Backend>, LocalStorage>,
    /// Same backend as its hosted type, for auth calls; `None` offline
    hosted: StoredValue<Option<Rc<SupabaseBackend>>, LocalStorage>,
    config: StoredValue<ClientConfig>,
    /// Who is signed in
    pub session: RwSignal<SessionState>,
    /// Trigger to reload page data - read
    pub reload_trigger: ReadSignal<u32>,
    /// Trigger to reload page data - write
    set_reload_trigger: WriteSignal<u32>,
}

impl AppContext {
    pub fn new(config: ClientConfig, reload_trigger: (ReadSignal<u32>, WriteSignal<u32>)) -> Self {
        let (backend, hosted): (Rc<dyn Backend>, Option<Rc<SupabaseBackend>>) = if config.is_hosted() {
            let supabase = SupabaseBackend::new(&config);
            let socket = SocketChangeSource::new(supabase.realtime_url());
            let supabase = Rc::new(supabase.with_change_source(Rc::new(socket)));
            tracing::info!(url = %config.supabase_url, "using hosted backend");
            (supabase.clone(), Some(supabase))
        } else {
            tracing::info!("using in-memory backend, nothing is persisted");
            (Rc::new(InMemoryBackend::new()), None)
        };

        Self {
            backend: StoredValue::new_local(backend),
            hosted: StoredValue::new_local(hosted),
            config: StoredValue::new(config),
            session: RwSignal::new(SessionState::default()),
            reload_trigger: reload_trigger.0,
            set_reload_trigger: reload_trigger.1,
        }
    }

    pub fn backend(&self) -> Rc<dyn Backend> {
        self.backend.get_value()
    }

    pub fn hosted(&self) -> Option<Rc<SupabaseBackend>> {
        self.hosted.get_value()
    }

    pub fn config(&self) -> ClientConfig {
        self.config.get_value()
    }

    /// Current session, tracked
    pub fn current_session(&self) -> Option<Session> {
        self.session.with(|state| state.session().cloned())
    }

    /// Trigger a reload of page data
    pub fn reload(&self) {
        self.set_reload_trigger.update(|v| *v += 1);
    }
}

pub fn use_app_context() -> AppContext {
    use_context::<AppContext>().expect("AppContext should be provided")
}
