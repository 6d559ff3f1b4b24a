//! The tick loop.
//!
//! Everything runs on one thread.  Every tick the [`Scheduler`]
//!
//! 1. refreshes the registry if the update interval has elapsed,
//! 2. drains *all* pending triggers and dispatches them in order (each one
//!    refreshes first, see [`Hotkeys::trigger`]),
//! 3. reloads the configuration if one of the actions asked for it,
//!
//! then sleeps for the tick interval.  There is no locking: the registry is
//! only ever touched from here.

use crate::command::Action;
use crate::config::{Config, ConfigError};
use crate::dispatcher::{Dispatched, Dispatcher};
use crate::hotkey::Hotkeys;
use crate::traits::{HotkeyRegistrar, Trigger, TriggerSource, WindowService};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Possible errors from the scheduler.  All of them end the process.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The trigger source broke down.
    #[error("trigger source failed: {0}")]
    Triggers(String),
}

/// Owns the dispatcher and the hotkey engine and drives both.
pub struct Scheduler<P, R>
where
    P: WindowService,
    R: HotkeyRegistrar + TriggerSource,
{
    dispatcher: Dispatcher<P>,
    hotkeys: Hotkeys<R>,
    config: Config,
    config_path: Option<PathBuf>,
    last_refresh: Option<Instant>,
    running: Arc<AtomicBool>,
}

impl<P, R> Scheduler<P, R>
where
    P: WindowService,
    R: HotkeyRegistrar + TriggerSource,
{
    /// Build the registry, apply the display settings and register every
    /// valid binding of `config`.
    ///
    /// Invalid or refused bindings are logged and skipped.  `config_path` is
    /// where [`reload`](Scheduler::reload) looks for a new configuration.
    pub fn new(
        platform: P,
        registrar: R,
        config: Config,
        config_path: Option<PathBuf>,
    ) -> Result<Self, SchedulerError> {
        let mut dispatcher = Dispatcher::new(platform);
        dispatcher.set_desktop_switch(config.desktop_switch()?);
        dispatcher.set_display_settings(config.display_settings());
        dispatcher.refresh();
        dispatcher.apply_display_settings();

        let mut hotkeys = Hotkeys::new(registrar);
        bind_all(&mut hotkeys, &config);

        Ok(Self {
            dispatcher,
            hotkeys,
            config,
            config_path,
            last_refresh: Some(Instant::now()),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher<P> {
        &self.dispatcher
    }

    pub fn hotkeys(&self) -> &Hotkeys<R> {
        &self.hotkeys
    }

    pub fn hotkeys_mut(&mut self) -> &mut Hotkeys<R> {
        &mut self.hotkeys
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared flag that keeps [`run`](Scheduler::run) going; clear it from
    /// anywhere (a Ctrl-C handler, another thread) to stop the loop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// One iteration of the loop at time `now`.
    pub fn tick(&mut self, now: Instant) -> Result<(), SchedulerError> {
        let due = self
            .last_refresh
            .map_or(true, |last| now.saturating_duration_since(last) >= self.config.update_interval());
        if due {
            self.dispatcher.refresh();
            self.last_refresh = Some(now);
        }

        let triggers = self
            .hotkeys
            .registrar_mut()
            .poll_triggers()
            .map_err(|e| SchedulerError::Triggers(e.to_string()))?;

        let mut reload = false;
        for trigger in triggers {
            match trigger {
                Trigger::Quit => {
                    info!("quit requested");
                    self.stop();
                    break;
                }
                Trigger::Hotkey(id) => match self.hotkeys.trigger(id, &mut self.dispatcher) {
                    Ok(Dispatched::Done) => {}
                    Ok(Dispatched::ReloadRequested) => reload = true,
                    Err(e) => warn!("hotkey {}: {}", id, e),
                },
            }
        }

        if reload {
            self.reload();
        }
        Ok(())
    }

    /// Re-read the configuration and re-apply it.
    ///
    /// If the file cannot be loaded the current configuration stays in
    /// effect.
    pub fn reload(&mut self) {
        let config = match &self.config_path {
            Some(path) => match Config::load_or_default(path) {
                Ok(config) => config,
                Err(e) => {
                    warn!("reload failed, keeping current configuration: {}", e);
                    return;
                }
            },
            None => Config::default(),
        };
        let desktop_switch = match config.desktop_switch() {
            Ok(desktop_switch) => desktop_switch,
            Err(e) => {
                warn!("reload failed, keeping current configuration: {}", e);
                return;
            }
        };

        self.dispatcher.set_desktop_switch(desktop_switch);
        self.dispatcher.set_display_settings(config.display_settings());
        self.dispatcher.apply_display_settings();

        self.hotkeys.clear();
        bind_all(&mut self.hotkeys, &config);
        self.config = config;
        info!("configuration reloaded");
    }

    /// Tick until the running flag is cleared or a quit trigger arrives.
    pub fn run(&mut self) -> Result<(), SchedulerError> {
        info!("twm running");
        while self.is_running() {
            self.tick(Instant::now())?;
            if !self.is_running() {
                break;
            }
            std::thread::sleep(self.config.tick_interval());
        }
        info!("twm stopped");
        Ok(())
    }
}

/// Register every binding of `config`, skipping the ones that fail.
fn bind_all<R: HotkeyRegistrar>(hotkeys: &mut Hotkeys<R>, config: &Config) {
    for (keycombo, action) in &config.hotkeys {
        let action: Action = match action.parse() {
            Ok(action) => action,
            Err(e) => {
                warn!("skipping hotkey {:?}: {}", keycombo, e);
                continue;
            }
        };
        if let Err(e) = hotkeys.add(keycombo, action) {
            warn!("skipping hotkey {:?}: {}", keycombo, e);
        }
    }
    debug!("{} of {} hotkeys registered", hotkeys.hotkeys().len(), config.hotkeys.len());
}
