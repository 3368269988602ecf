//! Drives the frame loop through its public traits only.

use std::cell::RefCell;
use std::rc::Rc;

use ash::vk::{self, Handle};
use inflight_platform::FramebufferSource;
use inflight_renderer::{
    FrameLoop, FrameRecorder, FrameState, FrameTarget, Presenter, SlotSync, SubmitQueue,
    SurfaceStatus, TickOutcome,
};
use inflight_rhi::{RhiError, RhiResult};

type Log = Rc<RefCell<Vec<String>>>;

struct Sync {
    log: Log,
    frames: usize,
}

impl SlotSync for Sync {
    fn frames_in_flight(&self) -> usize {
        self.frames
    }

    fn wait(&self, slot: usize, _timeout: u64) -> RhiResult<()> {
        self.log.borrow_mut().push(format!("wait {}", slot));
        Ok(())
    }

    fn reset(&self, slot: usize) -> RhiResult<()> {
        self.log.borrow_mut().push(format!("reset {}", slot));
        Ok(())
    }

    fn acquire_wait_handle(&self, slot: usize) -> vk::Semaphore {
        vk::Semaphore::from_raw(0x10 + slot as u64)
    }

    fn render_done_handle(&self, slot: usize) -> vk::Semaphore {
        vk::Semaphore::from_raw(0x20 + slot as u64)
    }

    fn completion_fence(&self, slot: usize) -> vk::Fence {
        vk::Fence::from_raw(0x30 + slot as u64)
    }

    fn recreate(&mut self) -> RhiResult<()> {
        self.log.borrow_mut().push("sync recreated".to_string());
        Ok(())
    }
}

struct Swapchain {
    log: Log,
    images: u32,
    next: u32,
    stale_acquires: usize,
}

impl Presenter for Swapchain {
    fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: 800,
            height: 600,
        }
    }

    fn framebuffer(&self, image_index: u32) -> Option<vk::Framebuffer> {
        (image_index < self.images).then(|| vk::Framebuffer::from_raw(0x40 + image_index as u64))
    }

    fn acquire(&mut self, _timeout: u64, _semaphore: vk::Semaphore) -> (u32, SurfaceStatus) {
        if self.stale_acquires > 0 {
            self.stale_acquires -= 1;
            self.log.borrow_mut().push("acquire stale".to_string());
            return (0, SurfaceStatus::Stale);
        }
        let image = self.next;
        self.next = (self.next + 1) % self.images;
        self.log.borrow_mut().push(format!("acquire {}", image));
        (image, SurfaceStatus::Ok)
    }

    fn present(&mut self, image_index: u32, _semaphore: vk::Semaphore) -> SurfaceStatus {
        self.log.borrow_mut().push(format!("present {}", image_index));
        SurfaceStatus::Ok
    }

    fn recreate(&mut self, _window: &mut dyn FramebufferSource) -> RhiResult<()> {
        self.next = 0;
        self.log.borrow_mut().push("surface recreated".to_string());
        Ok(())
    }
}

struct Queue {
    log: Log,
}

impl SubmitQueue for Queue {
    fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<(), vk::Result> {
        let slot = command_buffer.as_raw();
        assert_eq!(wait.as_raw(), 0x10 + slot);
        assert_eq!(signal.as_raw(), 0x20 + slot);
        assert_eq!(fence.as_raw(), 0x30 + slot);
        self.log.borrow_mut().push(format!("submit {}", slot));
        Ok(())
    }
}

struct Window;

impl FramebufferSource for Window {
    fn framebuffer_size(&self) -> (u32, u32) {
        (800, 600)
    }

    fn wait_events(&mut self) {}

    fn take_resized(&mut self) -> bool {
        false
    }
}

#[derive(Default)]
struct Recorder {
    targets: Vec<FrameTarget>,
    fail_next_record: bool,
}

impl FrameRecorder for Recorder {
    fn update(&mut self, target: &FrameTarget) -> RhiResult<()> {
        self.targets.push(*target);
        Ok(())
    }

    fn record(&mut self, target: &FrameTarget) -> RhiResult<vk::CommandBuffer> {
        if std::mem::take(&mut self.fail_next_record) {
            return Err(RhiError::VulkanError(vk::Result::ERROR_OUT_OF_HOST_MEMORY));
        }
        Ok(vk::CommandBuffer::from_raw(target.slot as u64))
    }
}

fn frame_loop(
    frames: usize,
    images: u32,
    stale_acquires: usize,
) -> (FrameLoop<Sync, Swapchain, Queue>, Log) {
    let log = Log::default();
    let frame_loop = FrameLoop::new(
        Sync {
            log: log.clone(),
            frames,
        },
        Swapchain {
            log: log.clone(),
            images,
            next: 0,
            stale_acquires,
        },
        Queue { log: log.clone() },
        u64::MAX,
    );
    (frame_loop, log)
}

#[test]
fn test_slots_and_images_cycle_independently() {
    let (mut frame_loop, _log) = frame_loop(2, 3, 0);
    let mut recorder = Recorder::default();

    for _ in 0..6 {
        let outcome = frame_loop.tick(&mut Window, &mut recorder).unwrap();
        assert_eq!(outcome, TickOutcome::Presented);
        assert_eq!(frame_loop.state(), FrameState::Idle);
    }

    let slots: Vec<usize> = recorder.targets.iter().map(|t| t.slot).collect();
    let images: Vec<u32> = recorder.targets.iter().map(|t| t.image_index).collect();
    assert_eq!(slots, vec![0, 1, 0, 1, 0, 1]);
    assert_eq!(images, vec![0, 1, 2, 0, 1, 2]);
    assert!(recorder.targets.iter().all(|t| t.extent.width == 800));
}

#[test]
fn test_fence_reset_directly_precedes_submit() {
    let (mut frame_loop, log) = frame_loop(3, 3, 0);
    let mut recorder = Recorder::default();

    for _ in 0..3 {
        frame_loop.tick(&mut Window, &mut recorder).unwrap();
    }

    let log = log.borrow();
    for (i, entry) in log.iter().enumerate() {
        if let Some(slot) = entry.strip_prefix("submit ") {
            assert_eq!(log[i - 1], format!("reset {}", slot));
        }
    }
}

#[test]
fn test_stale_acquire_recreates_without_recording() {
    let (mut frame_loop, log) = frame_loop(2, 3, 1);
    let mut recorder = Recorder::default();

    let first = frame_loop.tick(&mut Window, &mut recorder).unwrap();
    assert_eq!(first, TickOutcome::Recreated);
    assert!(recorder.targets.is_empty());
    assert_eq!(frame_loop.current_slot(), 0);
    assert!(!log.borrow().iter().any(|e| e.starts_with("submit")));

    let second = frame_loop.tick(&mut Window, &mut recorder).unwrap();
    assert_eq!(second, TickOutcome::Presented);
    assert_eq!(recorder.targets[0].slot, 0);
}

#[test]
fn test_failed_recording_skips_then_rebuilds() {
    let (mut frame_loop, log) = frame_loop(2, 2, 0);
    let mut recorder = Recorder {
        fail_next_record: true,
        ..Default::default()
    };

    let skipped = frame_loop.tick(&mut Window, &mut recorder).unwrap();
    assert_eq!(
        skipped,
        TickOutcome::Skipped(vk::Result::ERROR_OUT_OF_HOST_MEMORY)
    );
    assert!(!log.borrow().iter().any(|e| e.starts_with("reset")));

    let rebuilt = frame_loop.tick(&mut Window, &mut recorder).unwrap();
    assert_eq!(rebuilt, TickOutcome::Recreated);
    assert!(log.borrow().contains(&"sync recreated".to_string()));

    let presented = frame_loop.tick(&mut Window, &mut recorder).unwrap();
    assert_eq!(presented, TickOutcome::Presented);
}
