use crate::{
    dispatcher::{Availability, Dispatcher, UpdaterBackend, UpgradeCommand, UserAction},
    errors::DispatchError,
    event::UpgradeEvent,
    policy::OverridePolicy,
    state::UpgradeState,
    step::{StepView, UpgradeStep},
};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

pub struct InnerOrchestrator<B> {
    state:      Mutex<UpgradeState>,
    policy:     OverridePolicy,
    dispatcher: Dispatcher<B>,
}

/// A cheaply cloned handle to the upgrade state, shared by the event loop and the UI.
///
/// Every derivation samples the override policy and reads the state under a single lock, so
/// a render pass never observes a half-applied event.
#[derive(Shrinkwrap)]
pub struct Orchestrator<B>(Arc<InnerOrchestrator<B>>);

impl<B> Clone for Orchestrator<B> {
    fn clone(&self) -> Self { Orchestrator(self.0.clone()) }
}

impl<B> InnerOrchestrator<B> {
    pub fn policy(&self) -> &OverridePolicy { &self.policy }

    pub fn dispatcher(&self) -> &Dispatcher<B> { &self.dispatcher }

    fn state(&self) -> MutexGuard<'_, UpgradeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn view(&self) -> StepView {
        let state = self.state();
        state.view(state.overrides(&self.policy))
    }

    pub fn step(&self) -> UpgradeStep {
        let state = self.state();
        state.step(state.overrides(&self.policy))
    }

    pub fn availability(&self) -> Availability {
        let state = self.state();
        Availability::of(&state, state.overrides(&self.policy))
    }

    /// Applies an event, returning the new view if anything visible changed.
    pub fn handle_event(&self, event: UpgradeEvent) -> Option<StepView> {
        let mut state = self.state();
        let before = state.view(state.overrides(&self.policy));

        if !state.apply(event) {
            return None;
        }

        let after = state.view(state.overrides(&self.policy));
        if after == before {
            return None;
        }

        if after.step != before.step {
            debug!("upgrade step changed from {} to {}", before.step, after.step);
        }

        Some(after)
    }
}

impl<B: UpdaterBackend> InnerOrchestrator<B> {
    pub fn dispatch(&self, action: UserAction) -> Result<Option<UpgradeCommand>, DispatchError> {
        let mut state = self.state();
        let overrides = state.overrides(&self.policy);
        self.dispatcher.dispatch(&mut state, overrides, action).map_err(|why| {
            error!("{}", why);
            why
        })
    }

    pub fn start_upgrade(&self) -> Result<Option<UpgradeCommand>, DispatchError> {
        self.dispatch(UserAction::StartUpgrade)
    }

    pub fn abort_upgrade(&self) -> Result<Option<UpgradeCommand>, DispatchError> {
        self.dispatch(UserAction::AbortUpgrade)
    }

    pub fn start_installer(&self) -> Result<Option<UpgradeCommand>, DispatchError> {
        self.dispatch(UserAction::StartInstaller)
    }

    pub fn retry(&self) -> Result<Option<UpgradeCommand>, DispatchError> {
        self.dispatch(UserAction::Retry)
    }
}

impl<B: UpdaterBackend> Orchestrator<B> {
    pub fn new(backend: B, policy: OverridePolicy) -> Self {
        Orchestrator(Arc::new(InnerOrchestrator {
            state: Mutex::new(UpgradeState::new()),
            policy,
            dispatcher: Dispatcher::new(backend),
        }))
    }

    /// Consumes events until the backend hangs up, reporting each visible change.
    pub fn run(&self, events: &flume::Receiver<UpgradeEvent>, on_change: impl Fn(StepView)) {
        while let Ok(event) = events.recv() {
            trace!("received upgrade event: {:?}", event);
            if let Some(view) = self.handle_event(event) {
                on_change(view);
            }
        }

        info!("updater backend closed the event stream");
    }

    /// Runs the event loop on a background thread.
    pub fn spawn(
        &self,
        events: flume::Receiver<UpgradeEvent>,
        on_change: impl Fn(StepView) + Send + 'static,
    ) -> JoinHandle<()>
    where
        B: Send + Sync + 'static,
    {
        let orchestrator = self.clone();
        thread::spawn(move || orchestrator.run(&events, on_change))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::error::UpgradeError;

    type Commands = flume::Receiver<UpgradeCommand>;

    fn orchestrator() -> (Orchestrator<flume::Sender<UpgradeCommand>>, Commands) {
        let (tx, rx) = flume::unbounded();
        (Orchestrator::new(tx, OverridePolicy::new(false)), rx)
    }

    #[test]
    fn event_loop_on_background_thread() {
        let (orchestrator, _commands) = orchestrator();
        let (event_tx, event_rx) = flume::unbounded();
        let (view_tx, view_rx) = flume::unbounded();

        let handle = orchestrator.spawn(event_rx, move |view| {
            let _ = view_tx.send(view.step);
        });

        for event in vec![
            UpgradeEvent::DownloadStarted,
            UpgradeEvent::progress(50, "cdn"),
            UpgradeEvent::progress(100, "cdn"),
            UpgradeEvent::VerifyingInstaller,
            UpgradeEvent::VerifiedInstaller,
        ] {
            event_tx.send(event).unwrap();
        }

        drop(event_tx);
        handle.join().unwrap();

        assert_eq!(
            view_rx.try_iter().collect::<Vec<_>>(),
            vec![
                UpgradeStep::Download,
                UpgradeStep::Download,
                UpgradeStep::Download,
                UpgradeStep::Verify,
                UpgradeStep::Launch,
            ]
        );
        assert_eq!(orchestrator.step(), UpgradeStep::Launch);
    }

    #[test]
    fn abort_and_resume() {
        let (orchestrator, commands) = orchestrator();
        let mut steps = Vec::new();

        orchestrator.handle_event(UpgradeEvent::DownloadStarted);
        steps.push(orchestrator.step());

        assert_eq!(orchestrator.abort_upgrade().unwrap(), Some(UpgradeCommand::AbortUpgrade));
        orchestrator.handle_event(UpgradeEvent::Aborted);
        steps.push(orchestrator.step());

        // A late progress report from the cancelled download.
        assert_eq!(orchestrator.handle_event(UpgradeEvent::progress(70, "cdn")), None);
        assert_eq!(orchestrator.step(), UpgradeStep::Pause);

        assert_eq!(orchestrator.start_upgrade().unwrap(), Some(UpgradeCommand::StartUpgrade));
        orchestrator.handle_event(UpgradeEvent::DownloadStarted);
        steps.push(orchestrator.step());

        assert_eq!(steps, vec![UpgradeStep::Download, UpgradeStep::Pause, UpgradeStep::Download]);
        assert_eq!(
            commands.try_iter().collect::<Vec<_>>(),
            vec![UpgradeCommand::AbortUpgrade, UpgradeCommand::StartUpgrade]
        );
    }

    #[test]
    fn connectivity_changes_are_seen_on_next_render() {
        let (orchestrator, _commands) = orchestrator();
        let connectivity = orchestrator.policy().connectivity();

        orchestrator.handle_event(UpgradeEvent::DownloadStarted);
        orchestrator.handle_event(UpgradeEvent::Error { error: UpgradeError::DownloadFailed });
        assert_eq!(orchestrator.step(), UpgradeStep::Error);

        connectivity.store(true, std::sync::atomic::Ordering::SeqCst);
        let view = orchestrator.view();
        assert_eq!(view.step, UpgradeStep::Download);
        assert!(view.connection_blocked);

        // Retry remains possible: the failure is still unresolved.
        assert_eq!(orchestrator.availability().retry, Some(UpgradeCommand::StartUpgrade));
    }

    #[test]
    fn abort_is_refused_outside_download_and_verify() {
        let (orchestrator, commands) = orchestrator();

        orchestrator.handle_event(UpgradeEvent::VerifiedInstaller);
        assert_eq!(orchestrator.abort_upgrade().unwrap(), None);

        orchestrator.handle_event(UpgradeEvent::Error { error: UpgradeError::InstallerFailed });
        assert_eq!(orchestrator.abort_upgrade().unwrap(), None);

        assert!(commands.is_empty());
    }

    #[test]
    fn unchanged_view_is_not_reported() {
        let (orchestrator, _commands) = orchestrator();

        assert!(orchestrator.handle_event(UpgradeEvent::VerifiedInstaller).is_some());
        assert!(orchestrator.handle_event(UpgradeEvent::VerifiedInstaller).is_none());
    }

    #[test]
    fn backend_hang_up_is_reported() {
        let (orchestrator, commands) = orchestrator();
        drop(commands);

        assert!(orchestrator.start_upgrade().is_err());
        assert!(orchestrator.availability().start_upgrade);
    }
}
