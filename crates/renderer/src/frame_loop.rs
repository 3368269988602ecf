//! Frame loop: acquire, update, record, submit, present.
//!
//! [`FrameLoop`] owns the current frame slot and drives one tick at a time.
//! Its collaborators are traits so the ordering rules can be exercised
//! without a GPU:
//!
//! - [`SlotSync`] - per-slot fence and semaphores
//! - [`Presenter`] - swapchain images, depth and framebuffers
//! - [`SubmitQueue`] - the graphics queue
//! - [`FrameRecorder`] - writes uniforms and records the command buffer
//!
//! # Tick
//!
//! ```text
//! Idle
//!   | resize flag or pending rebuild -----------------------> Recreating
//!   | wait(slot fence)
//! Acquiring -- Stale ------------------------------------------> Recreating
//!   | Ok
//! Updating    (uniforms for this slot)
//! Recording   (render pass, draws, overlay)
//! Submitting  (reset fence, wait image_acquired, signal render_complete)
//! Presenting -- Stale or resize flag --------------------------> Recreating
//!   | slot = (slot + 1) % frames_in_flight
//! Idle
//! ```
//!
//! Any other failure skips the frame. The slot fence is only reset directly
//! before a submission, so a skipped frame never leaves a fence that nothing
//! will signal.

use ash::vk;
use inflight_platform::FramebufferSource;
use inflight_rhi::RhiResult;
use tracing::{debug, error, warn};

/// Synchronization objects for every frame slot.
pub trait SlotSync {
    fn frames_in_flight(&self) -> usize;

    /// Blocks until the GPU has finished the slot's previous submission.
    fn wait(&self, slot: usize, timeout: u64) -> RhiResult<()>;

    /// Returns the slot's fence to the unsignaled state.
    fn reset(&self, slot: usize) -> RhiResult<()>;

    fn wait_and_reset(&self, slot: usize, timeout: u64) -> RhiResult<()> {
        self.wait(slot, timeout)?;
        self.reset(slot)
    }

    /// Semaphore signaled by acquire and waited on by the submission.
    fn acquire_wait_handle(&self, slot: usize) -> vk::Semaphore;

    /// Semaphore signaled by the submission and waited on by present.
    fn render_done_handle(&self, slot: usize) -> vk::Semaphore;

    fn completion_fence(&self, slot: usize) -> vk::Fence;

    /// Destroys and rebuilds every slot. The device must be idle.
    fn recreate(&mut self) -> RhiResult<()>;
}

/// Result of an acquire or present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceStatus {
    Ok,
    /// Out of date or suboptimal; the surface must be rebuilt.
    Stale,
    Fatal(vk::Result),
}

impl SurfaceStatus {
    /// Classifies a raw swapchain result.
    pub fn from_result(result: Result<bool, vk::Result>) -> Self {
        match result {
            Ok(false) => SurfaceStatus::Ok,
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) | Err(vk::Result::SUBOPTIMAL_KHR) => {
                SurfaceStatus::Stale
            }
            Err(e) => SurfaceStatus::Fatal(e),
        }
    }
}

/// Presentable images plus the attachments drawn into them.
pub trait Presenter {
    fn extent(&self) -> vk::Extent2D;

    /// Framebuffer for the swapchain image `image_index`.
    fn framebuffer(&self, image_index: u32) -> Option<vk::Framebuffer>;

    /// Acquires the next image, signaling `image_acquired` when it is ready.
    ///
    /// The image index is meaningful only when the status is `Ok`.
    fn acquire(&mut self, timeout: u64, image_acquired: vk::Semaphore) -> (u32, SurfaceStatus);

    fn present(&mut self, image_index: u32, render_done: vk::Semaphore) -> SurfaceStatus;

    /// Rebuilds images, depth and framebuffers for the window's current size.
    ///
    /// Blocks while `window` reports a zero-sized framebuffer.
    fn recreate(&mut self, window: &mut dyn FramebufferSource) -> RhiResult<()>;
}

pub trait SubmitQueue {
    /// Submits `command_buffer`, waiting on `wait` at color attachment output
    /// and signaling `signal` and `fence` on completion.
    fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<(), vk::Result>;
}

/// What a recorder draws into during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTarget {
    /// Frame slot, in `0..frames_in_flight`.
    pub slot: usize,
    /// Swapchain image, unrelated to `slot`.
    pub image_index: u32,
    pub extent: vk::Extent2D,
    pub framebuffer: vk::Framebuffer,
}

/// Produces the work for one frame.
pub trait FrameRecorder {
    /// Writes the slot's uniform data. The slot's previous GPU work is done.
    fn update(&mut self, target: &FrameTarget) -> RhiResult<()>;

    /// Records the slot's command buffer and returns it ready for submission.
    fn record(&mut self, target: &FrameTarget) -> RhiResult<vk::CommandBuffer>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameState {
    #[default]
    Idle,
    Acquiring,
    Updating,
    Recording,
    Submitting,
    Presenting,
    Recreating,
}

/// How a tick ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame was submitted and presented.
    Presented,
    /// The surface was rebuilt before anything was drawn.
    Recreated,
    /// The frame was presented, then the surface was rebuilt.
    PresentedAndRecreated,
    /// The frame was abandoned after a non-recoverable status.
    Skipped(vk::Result),
}

/// Drives frames through a fixed set of slots.
///
/// # Type Parameters
///
/// * `S` - Slot synchronization
/// * `P` - Presentation surface
/// * `Q` - Submission queue
///
/// # Example
///
/// ```no_run
/// use inflight_renderer::frame_loop::{FrameLoop, FrameRecorder, Presenter, SlotSync, SubmitQueue};
/// use inflight_platform::FramebufferSource;
///
/// fn run<S: SlotSync, P: Presenter, Q: SubmitQueue>(
///     frame_loop: &mut FrameLoop<S, P, Q>,
///     window: &mut dyn FramebufferSource,
///     recorder: &mut impl FrameRecorder,
/// ) -> Result<(), inflight_rhi::RhiError> {
///     let outcome = frame_loop.tick(window, recorder)?;
///     println!("{:?}", outcome);
///     Ok(())
/// }
/// ```
pub struct FrameLoop<S, P, Q> {
    // Field order is drop order: the surface goes before the sync set.
    surface: P,
    sync: S,
    queue: Q,
    current_slot: usize,
    fence_timeout: u64,
    rebuild_pending: bool,
    state: FrameState,
}

impl<S: SlotSync, P: Presenter, Q: SubmitQueue> FrameLoop<S, P, Q> {
    /// Creates a loop starting at slot 0.
    ///
    /// # Arguments
    ///
    /// * `sync` - One entry per frame slot
    /// * `surface` - Already built presentation surface
    /// * `queue` - Queue the frames are submitted to
    /// * `fence_timeout` - Nanoseconds to wait on a slot fence
    pub fn new(sync: S, surface: P, queue: Q, fence_timeout: u64) -> Self {
        Self {
            surface,
            sync,
            queue,
            current_slot: 0,
            fence_timeout,
            rebuild_pending: false,
            state: FrameState::Idle,
        }
    }

    /// Slot the next tick will use.
    #[inline]
    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.sync.frames_in_flight()
    }

    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    #[inline]
    pub fn surface(&self) -> &P {
        &self.surface
    }

    /// Runs one frame.
    ///
    /// The resize flag of `window` is consumed here, once before acquiring
    /// and once after presenting.
    ///
    /// # Errors
    ///
    /// Only a failed recreation is returned. The next tick retries it.
    /// Every other failure is logged and reported as
    /// [`TickOutcome::Skipped`].
    pub fn tick<R>(
        &mut self,
        window: &mut dyn FramebufferSource,
        recorder: &mut R,
    ) -> RhiResult<TickOutcome>
    where
        R: FrameRecorder + ?Sized,
    {
        let slot = self.current_slot;

        if window.take_resized() || self.rebuild_pending {
            debug!("Resize requested, recreating surface before acquire");
            self.recreate(window)?;
            return Ok(TickOutcome::Recreated);
        }

        self.state = FrameState::Acquiring;
        if let Err(e) = self.sync.wait(slot, self.fence_timeout) {
            return Ok(self.skip("fence wait", e.vk_result()));
        }

        let (image_index, status) = self
            .surface
            .acquire(self.fence_timeout, self.sync.acquire_wait_handle(slot));
        match status {
            SurfaceStatus::Ok => {}
            SurfaceStatus::Stale => {
                debug!("Surface stale on acquire, recreating");
                self.recreate(window)?;
                return Ok(TickOutcome::Recreated);
            }
            SurfaceStatus::Fatal(e) => return Ok(self.skip("acquire", e)),
        }

        let Some(framebuffer) = self.surface.framebuffer(image_index) else {
            warn!("No framebuffer for image {}, recreating", image_index);
            self.recreate(window)?;
            return Ok(TickOutcome::Recreated);
        };

        let target = FrameTarget {
            slot,
            image_index,
            extent: self.surface.extent(),
            framebuffer,
        };

        self.state = FrameState::Updating;
        if let Err(e) = recorder.update(&target) {
            return Ok(self.abandon("update", e.vk_result()));
        }

        self.state = FrameState::Recording;
        let command_buffer = match recorder.record(&target) {
            Ok(command_buffer) => command_buffer,
            Err(e) => return Ok(self.abandon("record", e.vk_result())),
        };

        self.state = FrameState::Submitting;
        if let Err(e) = self.sync.reset(slot) {
            return Ok(self.abandon("fence reset", e.vk_result()));
        }
        if let Err(e) = self.queue.submit(
            command_buffer,
            self.sync.acquire_wait_handle(slot),
            self.sync.render_done_handle(slot),
            self.sync.completion_fence(slot),
        ) {
            return Ok(self.abandon("submit", e));
        }

        self.state = FrameState::Presenting;
        let status = self
            .surface
            .present(image_index, self.sync.render_done_handle(slot));

        // The slot's fence is now owned by the submission, whatever present says.
        self.current_slot = (slot + 1) % self.sync.frames_in_flight();

        let resized = window.take_resized();
        match status {
            SurfaceStatus::Ok if !resized => {
                self.state = FrameState::Idle;
                Ok(TickOutcome::Presented)
            }
            SurfaceStatus::Ok | SurfaceStatus::Stale => {
                debug!(
                    "Recreating surface after present (stale: {}, resized: {})",
                    status == SurfaceStatus::Stale,
                    resized
                );
                self.recreate(window)?;
                Ok(TickOutcome::PresentedAndRecreated)
            }
            SurfaceStatus::Fatal(e) => {
                // The flag is already consumed; carry the resize into the next tick.
                self.rebuild_pending |= resized;
                Ok(self.skip("present", e))
            }
        }
    }

    /// Rebuilds the surface and the sync set.
    ///
    /// # Errors
    ///
    /// Returns the first failure. The rebuild is attempted again on the next
    /// tick.
    pub fn recreate(&mut self, window: &mut dyn FramebufferSource) -> RhiResult<()> {
        self.state = FrameState::Recreating;
        self.rebuild_pending = true;

        if let Err(e) = self.surface.recreate(window) {
            error!("Surface recreation failed: {}", e);
            return Err(e);
        }
        if let Err(e) = self.sync.recreate() {
            error!("Frame sync recreation failed: {}", e);
            return Err(e);
        }

        self.rebuild_pending = false;
        self.state = FrameState::Idle;

        let extent = self.surface.extent();
        debug!("Surface recreated at {}x{}", extent.width, extent.height);
        Ok(())
    }

    fn skip(&mut self, stage: &str, result: vk::Result) -> TickOutcome {
        error!("Frame skipped: {} failed with {:?}", stage, result);
        self.state = FrameState::Idle;
        TickOutcome::Skipped(result)
    }

    /// Skips a frame whose image was acquired but never submitted.
    ///
    /// The acquire semaphore stays signaled with nothing waiting on it, so the
    /// sync set is rebuilt before the next acquire.
    fn abandon(&mut self, stage: &str, result: vk::Result) -> TickOutcome {
        self.rebuild_pending = true;
        self.skip(stage, result)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};
    use inflight_resources::default_scene;
    use inflight_scene::{Camera, Transform};

    use super::*;
    use crate::frame_resources::FrameResourceSet;
    use crate::scene::{CameraObject, Mesh, Scene};
    use crate::testing::{
        Event, EventLog, HostBlock, MockPresenter, MockQueue, MockSync, ScriptedWindow, extent,
        fake_command_buffer, fake_sets,
    };
    use crate::ubo::{CameraUbo, MeshUbo};

    type TestLoop = FrameLoop<MockSync, MockPresenter, MockQueue>;

    fn test_loop(log: &EventLog, frames_in_flight: usize) -> TestLoop {
        FrameLoop::new(
            MockSync::new(log.clone(), frames_in_flight),
            MockPresenter::new(log.clone(), extent(800, 600), 3),
            MockQueue::new(log.clone()),
            u64::MAX,
        )
    }

    fn host_set<T: bytemuck::Pod>(
        log: &EventLog,
        name: &str,
        frames: usize,
    ) -> FrameResourceSet<T, HostBlock> {
        let blocks = (0..frames)
            .map(|slot| HostBlock::new(log.clone(), name, slot))
            .collect();
        FrameResourceSet::from_parts(blocks, fake_sets(frames)).unwrap()
    }

    fn test_scene(log: &EventLog, frames: usize) -> Scene<HostBlock> {
        let camera = CameraObject::new(Camera::new(), host_set(log, "camera", frames));
        let meshes = default_scene()
            .into_iter()
            .map(|desc| {
                let uniforms = host_set(log, &desc.name, frames);
                Mesh::new(
                    desc.name,
                    Transform::new().with_position(desc.position),
                    uniforms,
                )
            })
            .collect();
        Scene::new(camera, meshes)
    }

    /// Writes the scene and hands back a fabricated command buffer.
    struct HostRecorder {
        log: EventLog,
        scene: Scene<HostBlock>,
    }

    impl FrameRecorder for HostRecorder {
        fn update(&mut self, target: &FrameTarget) -> RhiResult<()> {
            self.scene.write_uniforms(target.slot, target.extent)
        }

        fn record(&mut self, target: &FrameTarget) -> RhiResult<vk::CommandBuffer> {
            self.log.push(Event::Record(target.slot));
            Ok(fake_command_buffer(target.slot))
        }
    }

    fn recorder(log: &EventLog, frames: usize) -> HostRecorder {
        HostRecorder {
            log: log.clone(),
            scene: test_scene(log, frames),
        }
    }

    #[test]
    fn test_slot_cycles_modulo_frames_in_flight() {
        for frames in 1..=3 {
            let log = EventLog::default();
            let mut frame_loop = test_loop(&log, frames);
            let mut window = ScriptedWindow::fixed(800, 600);
            let mut recorder = recorder(&log, frames);

            for k in 0..10 {
                assert_eq!(frame_loop.current_slot(), k % frames);
                let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
                assert_eq!(outcome, TickOutcome::Presented);
            }

            let submitted: Vec<usize> = log
                .events()
                .iter()
                .filter_map(|e| match e {
                    Event::Submit(slot) => Some(*slot),
                    _ => None,
                })
                .collect();
            let expected: Vec<usize> = (0..10).map(|k| k % frames).collect();
            assert_eq!(submitted, expected);
        }
    }

    #[test]
    fn test_writes_follow_fence_signal() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        for _ in 0..10 {
            frame_loop.tick(&mut window, &mut recorder).unwrap();
        }

        let events = log.events();
        for (i, event) in events.iter().enumerate() {
            let Event::Write { slot, .. } = event else {
                continue;
            };
            let last_submit = events[..i]
                .iter()
                .rposition(|e| *e == Event::Submit(*slot));
            let Some(submit_at) = last_submit else {
                continue;
            };
            let signaled = events[submit_at..i]
                .iter()
                .any(|e| *e == Event::FenceSignaled(*slot));
            assert!(
                signaled,
                "write to slot {} at event {} precedes the fence of submit {}",
                slot, i, submit_at
            );
        }

        // Each of the 10 ticks wrote the camera and three meshes.
        let writes = events
            .iter()
            .filter(|e| matches!(e, Event::Write { .. }))
            .count();
        assert_eq!(writes, 40);
    }

    #[test]
    fn test_fence_reset_only_before_submit() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        frame_loop.tick(&mut window, &mut recorder).unwrap();

        let events = log.events();
        let reset = events.iter().position(|e| *e == Event::FenceReset(0)).unwrap();
        let record = events.iter().position(|e| *e == Event::Record(0)).unwrap();
        let submit = events.iter().position(|e| *e == Event::Submit(0)).unwrap();
        assert!(record < reset);
        assert_eq!(reset + 1, submit);
    }

    #[test]
    fn test_stale_acquire_recreates_without_submit() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        frame_loop
            .surface
            .script_acquire(SurfaceStatus::Stale);

        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Recreated);
        assert_eq!(frame_loop.current_slot(), 0);
        assert_eq!(frame_loop.state(), FrameState::Idle);

        let events = log.events();
        assert!(events.contains(&Event::SurfaceRecreated(extent(800, 600))));
        assert!(events.contains(&Event::SyncRecreated));
        assert!(!events.iter().any(|e| matches!(e, Event::Submit(_))));
        assert!(!events.iter().any(|e| matches!(e, Event::Write { .. })));
        assert!(!events.iter().any(|e| matches!(e, Event::Present(_))));

        // The next tick draws normally.
        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Presented);
    }

    #[test]
    fn test_stale_present_recreates_after_submit() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        frame_loop
            .surface
            .script_present(SurfaceStatus::Stale);

        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::PresentedAndRecreated);
        assert_eq!(frame_loop.current_slot(), 1);

        let events = log.events();
        let present = events
            .iter()
            .position(|e| matches!(e, Event::Present(_)))
            .unwrap();
        let recreated = events
            .iter()
            .position(|e| *e == Event::SyncRecreated)
            .unwrap();
        assert!(present < recreated);
    }

    #[test]
    fn test_no_submit_between_stale_and_next_acquire() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        frame_loop.surface.script_acquire(SurfaceStatus::Ok);
        frame_loop.surface.script_acquire(SurfaceStatus::Stale);
        frame_loop.surface.script_acquire(SurfaceStatus::Stale);
        frame_loop.surface.script_present(SurfaceStatus::Ok);
        frame_loop.surface.script_present(SurfaceStatus::Stale);

        for _ in 0..6 {
            frame_loop.tick(&mut window, &mut recorder).unwrap();
        }

        let events = log.events();
        for (i, event) in events.iter().enumerate() {
            if *event != Event::Acquire(SurfaceStatus::Stale) {
                continue;
            }
            for later in &events[i + 1..] {
                match later {
                    Event::Acquire(SurfaceStatus::Ok) => break,
                    Event::Submit(_) => panic!("submit after stale acquire at event {}", i),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_resize_flag_consumed_once() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        window.raise_resized();
        let first = frame_loop.tick(&mut window, &mut recorder).unwrap();
        let second = frame_loop.tick(&mut window, &mut recorder).unwrap();
        let third = frame_loop.tick(&mut window, &mut recorder).unwrap();

        assert_eq!(first, TickOutcome::Recreated);
        assert_eq!(second, TickOutcome::Presented);
        assert_eq!(third, TickOutcome::Presented);

        let recreations = log
            .events()
            .iter()
            .filter(|e| matches!(e, Event::SurfaceRecreated(_)))
            .count();
        assert_eq!(recreations, 1);
    }

    #[test]
    fn test_resize_during_frame_recreates_after_present() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        // Raised while the frame is in flight, seen by the post-present check.
        frame_loop.surface.raise_resize_on_present(&window);
        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::PresentedAndRecreated);

        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Presented);
    }

    #[test]
    fn test_fatal_present_advances_slot_without_rebuild() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        frame_loop
            .surface
            .script_present(SurfaceStatus::Fatal(vk::Result::ERROR_SURFACE_LOST_KHR));

        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Skipped(vk::Result::ERROR_SURFACE_LOST_KHR)
        );
        assert_eq!(frame_loop.current_slot(), 1);
        assert_eq!(frame_loop.state(), FrameState::Idle);

        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Presented);
        assert!(
            !log.events()
                .iter()
                .any(|e| matches!(e, Event::SurfaceRecreated(_)))
        );
    }

    #[test]
    fn test_resize_during_failed_present_recreates_next_tick() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        frame_loop.surface.raise_resize_on_present(&window);
        frame_loop
            .surface
            .script_present(SurfaceStatus::Fatal(vk::Result::ERROR_SURFACE_LOST_KHR));

        let first = frame_loop.tick(&mut window, &mut recorder).unwrap();
        let second = frame_loop.tick(&mut window, &mut recorder).unwrap();
        let third = frame_loop.tick(&mut window, &mut recorder).unwrap();

        assert_eq!(
            first,
            TickOutcome::Skipped(vk::Result::ERROR_SURFACE_LOST_KHR)
        );
        assert_eq!(second, TickOutcome::Recreated);
        assert_eq!(third, TickOutcome::Presented);

        let recreations = log
            .events()
            .iter()
            .filter(|e| matches!(e, Event::SurfaceRecreated(_)))
            .count();
        assert_eq!(recreations, 1);
    }

    #[test]
    fn test_fatal_acquire_skips_frame() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        frame_loop
            .surface
            .script_acquire(SurfaceStatus::Fatal(vk::Result::ERROR_DEVICE_LOST));

        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Skipped(vk::Result::ERROR_DEVICE_LOST));
        assert_eq!(frame_loop.current_slot(), 0);
        assert!(!log.events().iter().any(|e| matches!(e, Event::FenceReset(_))));

        // The fence was never reset, so the retry does not block.
        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Presented);
        assert_eq!(frame_loop.current_slot(), 1);
    }

    #[test]
    fn test_failed_submit_rebuilds_next_tick() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        frame_loop.queue.fail_next(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);

        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Skipped(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
        );
        assert_eq!(frame_loop.current_slot(), 0);

        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Recreated);

        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Presented);
    }

    #[test]
    fn test_failed_recreation_is_retried() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        window.raise_resized();
        frame_loop.surface.fail_next_recreate();

        assert!(frame_loop.tick(&mut window, &mut recorder).is_err());
        assert_eq!(frame_loop.state(), FrameState::Recreating);

        // The flag was consumed, the pending rebuild carries the retry.
        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Recreated);
        assert_eq!(frame_loop.state(), FrameState::Idle);
    }

    #[test]
    fn test_minimized_window_blocks_recreation() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::sequence(&[(0, 0), (0, 0), (800, 600)]);
        let mut recorder = recorder(&log, 2);

        window.raise_resized();
        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Recreated);
        assert_eq!(window.wait_count(), 2);
        assert_eq!(frame_loop.surface().extent(), extent(800, 600));
    }

    #[test]
    fn test_end_to_end_uniforms() {
        let log = EventLog::default();
        let mut frame_loop = test_loop(&log, 2);
        let mut window = ScriptedWindow::fixed(800, 600);
        let mut recorder = recorder(&log, 2);

        let outcome = frame_loop.tick(&mut window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Presented);

        let scene = &recorder.scene;
        let positions = [
            Vec3::new(-1.0, 0.0, -2.0),
            Vec3::new(1.0, 0.0, -2.0),
            Vec3::new(0.0, 0.0, -3.5),
        ];
        assert_eq!(scene.meshes().len(), 3);
        for (mesh, position) in scene.meshes().iter().zip(positions) {
            let written: MeshUbo = mesh.uniforms().block(0).read();
            assert_eq!(written.model, Mat4::from_translation(position));
            // Slot 1 has not been used yet.
            assert!(mesh.uniforms().block(1).is_empty());
        }

        let camera: CameraUbo = scene.camera().uniforms().block(0).read();
        let expected = Camera::new();
        assert_eq!(expected.fov_degrees(), 70.0);
        assert_eq!(camera.view, Mat4::IDENTITY);
        assert_eq!(camera.proj, expected.projection_matrix(800.0 / 600.0));

        let mut raw = Mat4::perspective_rh(70f32.to_radians(), 800.0 / 600.0, 0.01, 100.0);
        raw.y_axis.y = -raw.y_axis.y;
        assert_eq!(camera.proj, raw);
    }

    #[test]
    fn test_surface_status_from_result() {
        assert_eq!(SurfaceStatus::from_result(Ok(false)), SurfaceStatus::Ok);
        assert_eq!(SurfaceStatus::from_result(Ok(true)), SurfaceStatus::Stale);
        assert_eq!(
            SurfaceStatus::from_result(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)),
            SurfaceStatus::Stale
        );
        assert_eq!(
            SurfaceStatus::from_result(Err(vk::Result::SUBOPTIMAL_KHR)),
            SurfaceStatus::Stale
        );
        assert_eq!(
            SurfaceStatus::from_result(Err(vk::Result::ERROR_SURFACE_LOST_KHR)),
            SurfaceStatus::Fatal(vk::Result::ERROR_SURFACE_LOST_KHR)
        );
    }

    #[test]
    fn test_wait_and_reset_orders_wait_first() {
        let log = EventLog::default();
        let sync = MockSync::new(log.clone(), 2);
        sync.wait_and_reset(1, u64::MAX).unwrap();
        assert_eq!(log.events(), vec![Event::FenceWait(1), Event::FenceReset(1)]);
    }
}
