use crate::actions::{self, Action};
use crate::canvas::{Canvas, Point, Size};
use crate::client::TelemetryClient;
use crate::clipboard::{Clipboard, ClipboardError, SystemClipboard};
use crate::hits::HitRegionRegistry;
use crate::host::{Handled, HostHandler, HostNode, SharedSurface};
use crate::input::{CursorHint, Dispatch, InteractionDispatcher};
use crate::poller::{TelemetryPoller, DEFAULT_POLL_INTERVAL};
use crate::render::{self, FrameInput, LayoutOutput};
use crate::resize::ResizePolicy;
use crate::state::{Applied, StateUpdate, WidgetState};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardOptions {
    pub size: Size,
    pub min_width: f32,
    pub poll_interval: Duration,
    pub single_flight: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            size: Size::new(560.0, 360.0),
            min_width: 520.0,
            poll_interval: DEFAULT_POLL_INTERVAL,
            single_flight: false,
        }
    }
}

pub struct Dashboard {
    client: TelemetryClient,
    state: WidgetState,
    node: HostNode,
    registry: HitRegionRegistry,
    dispatcher: InteractionDispatcher,
    poller: TelemetryPoller,
    resize: ResizePolicy,
    clipboard: Box<dyn Clipboard>,
    updates_tx: UnboundedSender<StateUpdate>,
    updates_rx: UnboundedReceiver<StateUpdate>,
    tasks: Vec<JoinHandle<()>>,
    created: Instant,
    removed: bool,
}

impl Dashboard {
    // Must be called from within a tokio runtime.
    pub fn new(client: TelemetryClient, surface: SharedSurface, options: DashboardOptions) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let mut poller =
            TelemetryPoller::new(options.poll_interval).with_single_flight(options.single_flight);
        poller.start(client.clone(), updates_tx.clone());

        info!(base_url = client.base_url(), "dashboard created");
        Self {
            client,
            state: WidgetState::default(),
            node: HostNode::new(options.size),
            registry: HitRegionRegistry::new(),
            dispatcher: InteractionDispatcher::new(surface),
            poller,
            resize: ResizePolicy::default().with_min_width(options.min_width),
            clipboard: Box::new(SystemClipboard),
            updates_tx,
            updates_rx,
            tasks: Vec::new(),
            created: Instant::now(),
            removed: false,
        }
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn push_host_handler(&mut self, handler: Box<dyn HostHandler>) {
        self.dispatcher.push_host_handler(handler);
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn node(&self) -> &HostNode {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut HostNode {
        &mut self.node
    }

    pub fn registry(&self) -> &HitRegionRegistry {
        &self.registry
    }

    pub fn poller(&self) -> &TelemetryPoller {
        &self.poller
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates_rx.try_recv() {
            if let Applied::Snapshot { first: true } = self.state.apply(update) {
                if self.resize.apply_width_floor(&mut self.node) {
                    debug!(width = self.node.size.width, "width floor applied");
                }
            }
            applied += 1;
        }
        if applied > 0 {
            self.node.set_dirty_canvas();
        }
        applied
    }

    pub fn draw<C: Canvas + ?Sized>(&mut self, canvas: &mut C) -> LayoutOutput {
        let elapsed = self.created.elapsed();
        self.draw_at(canvas, elapsed)
    }

    pub fn draw_at<C: Canvas + ?Sized>(&mut self, canvas: &mut C, elapsed: Duration) -> LayoutOutput {
        self.pump();
        let frame = FrameInput {
            size: self.node.size,
            content_top: self.node.content_bottom,
            elapsed,
        };
        let output = render::render(canvas, &frame, &self.state, &mut self.registry);
        if self.resize.apply(&mut self.node, &output) {
            self.node.set_dirty_canvas();
        }
        output
    }

    pub fn pointer_down(&mut self, position: Point) -> Dispatch {
        let generation = self.registry.generation();
        self.pointer_down_at(generation, position)
    }

    pub fn pointer_down_at(&mut self, generation: u64, position: Point) -> Dispatch {
        if self.removed {
            return Dispatch::Delegated(Handled::Ignored);
        }
        let dispatch = self.dispatcher.pointer_down(
            &self.registry,
            generation,
            position,
            &mut self.state,
            &mut self.node,
        );
        if let Dispatch::Action(action) = dispatch {
            self.invoke(action);
        }
        dispatch
    }

    pub fn pointer_move(&mut self, position: Point) -> Option<CursorHint> {
        if self.removed {
            return None;
        }
        self.dispatcher
            .pointer_move(&self.registry, self.node.size, position)
    }

    pub fn run(&mut self) {
        if self.removed {
            return;
        }
        let task = actions::spawn_run(self.client.clone(), self.updates_tx.clone());
        self.track(task);
    }

    pub fn invoke(&mut self, action: Action) {
        if self.removed {
            return;
        }
        debug!(action = action.key(), "toolbar action");
        match action {
            Action::FreeVram => {
                let task = actions::spawn_free_vram(self.client.clone(), self.updates_tx.clone());
                self.track(task);
            }
            Action::FreeRam => {
                let task = actions::spawn_free_ram(self.client.clone(), self.updates_tx.clone());
                self.track(task);
            }
            Action::Copy => {
                let _ = self.copy_report();
            }
        }
    }

    pub fn copy_report(&mut self) -> Result<(), ClipboardError> {
        self.clipboard.set_text(self.state.report()).map_err(|err| {
            warn!(error = %err, "copy to clipboard failed");
            self.state.push_alert(format!("Copy failed: {err}"));
            err
        })
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        self.pump();
        self.state.take_alerts()
    }

    pub fn remove(&mut self) -> bool {
        if self.removed {
            return false;
        }
        self.removed = true;
        self.poller.stop();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.dispatcher.detach();
        self.registry.clear();
        info!("dashboard removed");
        true
    }

    fn track(&mut self, task: JoinHandle<()>) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(task);
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.remove();
    }
}
