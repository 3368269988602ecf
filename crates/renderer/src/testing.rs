//! Scripted collaborators for exercising the frame loop without a GPU.
//!
//! Every mock appends to a shared [`EventLog`], so tests can assert on the
//! order in which fences, writes, submissions and presents happened. Vulkan
//! handles are fabricated with `vk::Handle::from_raw` and encode the slot or
//! image they belong to.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use ash::vk::{self, Handle};
use bytemuck::Pod;
use inflight_platform::{FramebufferSource, wait_for_nonzero_size};
use inflight_rhi::{RhiError, RhiResult};

use crate::frame_loop::{Presenter, SlotSync, SubmitQueue, SurfaceStatus};
use crate::frame_resources::UniformBlock;

const FENCE_BASE: u64 = 0x1000;
const ACQUIRED_BASE: u64 = 0x2000;
const RENDER_DONE_BASE: u64 = 0x3000;
const FRAMEBUFFER_BASE: u64 = 0x4000;
const COMMAND_BUFFER_BASE: u64 = 0x5000;
const DESCRIPTOR_SET_BASE: u64 = 0x6000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    FenceWait(usize),
    /// The simulated GPU finished the slot's last submission.
    FenceSignaled(usize),
    FenceReset(usize),
    Write { name: String, slot: usize },
    Record(usize),
    Submit(usize),
    Acquire(SurfaceStatus),
    Present(u32),
    SurfaceRecreated(vk::Extent2D),
    SyncRecreated,
}

#[derive(Clone, Debug, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    /// Index of the last event matching `pred`.
    fn last(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.0.borrow().iter().rposition(pred)
    }
}

pub fn extent(width: u32, height: u32) -> vk::Extent2D {
    vk::Extent2D { width, height }
}

pub fn fake_sets(count: usize) -> Vec<vk::DescriptorSet> {
    (0..count as u64)
        .map(|i| vk::DescriptorSet::from_raw(DESCRIPTOR_SET_BASE + i))
        .collect()
}

pub fn fake_command_buffer(slot: usize) -> vk::CommandBuffer {
    vk::CommandBuffer::from_raw(COMMAND_BUFFER_BASE + slot as u64)
}

/// Uniform block backed by host memory that logs every write.
pub struct HostBlock {
    log: EventLog,
    name: String,
    slot: usize,
    bytes: Vec<u8>,
}

impl HostBlock {
    pub fn new(log: EventLog, name: &str, slot: usize) -> Self {
        Self {
            log,
            name: name.to_string(),
            slot,
            bytes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn read<T: Pod>(&self) -> T {
        bytemuck::pod_read_unaligned(&self.bytes)
    }
}

impl UniformBlock for HostBlock {
    fn write_bytes(&mut self, bytes: &[u8]) -> RhiResult<()> {
        self.log.push(Event::Write {
            name: self.name.clone(),
            slot: self.slot,
        });
        self.bytes = bytes.to_vec();
        Ok(())
    }
}

/// Fences whose state is derived from the event log.
///
/// A fence is pending after a submission until it is waited on, at which
/// point the GPU is assumed to finish. Waiting on a fence that was reset
/// and never submitted fails with `TIMEOUT` instead of hanging.
pub struct MockSync {
    log: EventLog,
    frames_in_flight: usize,
}

impl MockSync {
    pub fn new(log: EventLog, frames_in_flight: usize) -> Self {
        Self {
            log,
            frames_in_flight,
        }
    }

    fn is_pending(&self, slot: usize) -> bool {
        let last = self.log.last(|e| {
            matches!(e, Event::Submit(s) | Event::FenceSignaled(s) if *s == slot)
                || *e == Event::SyncRecreated
        });
        last.is_some_and(|i| self.log.events()[i] == Event::Submit(slot))
    }

    fn is_unsignaled(&self, slot: usize) -> bool {
        let last = self.log.last(|e| {
            matches!(
                e,
                Event::Submit(s) | Event::FenceSignaled(s) | Event::FenceReset(s) if *s == slot
            ) || *e == Event::SyncRecreated
        });
        last.is_some_and(|i| self.log.events()[i] == Event::FenceReset(slot))
    }
}

impl SlotSync for MockSync {
    fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    fn wait(&self, slot: usize, _timeout: u64) -> RhiResult<()> {
        if self.is_pending(slot) {
            self.log.push(Event::FenceSignaled(slot));
        } else if self.is_unsignaled(slot) {
            return Err(RhiError::VulkanError(vk::Result::TIMEOUT));
        }
        self.log.push(Event::FenceWait(slot));
        Ok(())
    }

    fn reset(&self, slot: usize) -> RhiResult<()> {
        assert!(
            !self.is_pending(slot),
            "fence {} reset while its submission is in flight",
            slot
        );
        self.log.push(Event::FenceReset(slot));
        Ok(())
    }

    fn acquire_wait_handle(&self, slot: usize) -> vk::Semaphore {
        vk::Semaphore::from_raw(ACQUIRED_BASE + slot as u64)
    }

    fn render_done_handle(&self, slot: usize) -> vk::Semaphore {
        vk::Semaphore::from_raw(RENDER_DONE_BASE + slot as u64)
    }

    fn completion_fence(&self, slot: usize) -> vk::Fence {
        vk::Fence::from_raw(FENCE_BASE + slot as u64)
    }

    fn recreate(&mut self) -> RhiResult<()> {
        self.log.push(Event::SyncRecreated);
        Ok(())
    }
}

pub struct MockQueue {
    log: EventLog,
    fail_next: Cell<Option<vk::Result>>,
}

impl MockQueue {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            fail_next: Cell::new(None),
        }
    }

    pub fn fail_next(&self, result: vk::Result) {
        self.fail_next.set(Some(result));
    }
}

impl SubmitQueue for MockQueue {
    fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<(), vk::Result> {
        if let Some(result) = self.fail_next.take() {
            return Err(result);
        }

        let slot = (fence.as_raw() - FENCE_BASE) as usize;
        assert_eq!(command_buffer, fake_command_buffer(slot));
        assert_eq!(wait.as_raw(), ACQUIRED_BASE + slot as u64);
        assert_eq!(signal.as_raw(), RENDER_DONE_BASE + slot as u64);

        self.log.push(Event::Submit(slot));
        Ok(())
    }
}

/// Swapchain stand-in with scripted acquire and present results.
///
/// Unscripted calls succeed. Images are handed out round robin.
pub struct MockPresenter {
    log: EventLog,
    extent: vk::Extent2D,
    image_count: u32,
    next_image: u32,
    acquire_script: VecDeque<SurfaceStatus>,
    present_script: VecDeque<SurfaceStatus>,
    fail_next_recreate: bool,
    resize_on_present: Option<Rc<Cell<bool>>>,
}

impl MockPresenter {
    pub fn new(log: EventLog, extent: vk::Extent2D, image_count: u32) -> Self {
        Self {
            log,
            extent,
            image_count,
            next_image: 0,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            fail_next_recreate: false,
            resize_on_present: None,
        }
    }

    pub fn script_acquire(&mut self, status: SurfaceStatus) {
        self.acquire_script.push_back(status);
    }

    pub fn script_present(&mut self, status: SurfaceStatus) {
        self.present_script.push_back(status);
    }

    pub fn fail_next_recreate(&mut self) {
        self.fail_next_recreate = true;
    }

    /// Raises `window`'s resize flag during the next present.
    pub fn raise_resize_on_present(&mut self, window: &ScriptedWindow) {
        self.resize_on_present = Some(window.resized.clone());
    }
}

impl Presenter for MockPresenter {
    fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    fn framebuffer(&self, image_index: u32) -> Option<vk::Framebuffer> {
        (image_index < self.image_count)
            .then(|| vk::Framebuffer::from_raw(FRAMEBUFFER_BASE + image_index as u64))
    }

    fn acquire(&mut self, _timeout: u64, _image_acquired: vk::Semaphore) -> (u32, SurfaceStatus) {
        let status = self.acquire_script.pop_front().unwrap_or(SurfaceStatus::Ok);
        self.log.push(Event::Acquire(status));
        if status != SurfaceStatus::Ok {
            return (0, status);
        }

        let image = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count;
        (image, status)
    }

    fn present(&mut self, image_index: u32, _render_done: vk::Semaphore) -> SurfaceStatus {
        if let Some(flag) = self.resize_on_present.take() {
            flag.set(true);
        }
        self.log.push(Event::Present(image_index));
        self.present_script.pop_front().unwrap_or(SurfaceStatus::Ok)
    }

    fn recreate(&mut self, window: &mut dyn FramebufferSource) -> RhiResult<()> {
        if std::mem::take(&mut self.fail_next_recreate) {
            return Err(RhiError::SwapchainError("scripted failure".to_string()));
        }

        let (width, height) = wait_for_nonzero_size(window);
        self.extent = extent(width, height);
        self.next_image = 0;
        self.log.push(Event::SurfaceRecreated(self.extent));
        Ok(())
    }
}

/// Window whose size advances through a script on every `wait_events`.
pub struct ScriptedWindow {
    sizes: Vec<(u32, u32)>,
    cursor: usize,
    waits: usize,
    resized: Rc<Cell<bool>>,
}

impl ScriptedWindow {
    pub fn fixed(width: u32, height: u32) -> Self {
        Self::sequence(&[(width, height)])
    }

    /// The last size repeats once the script runs out.
    pub fn sequence(sizes: &[(u32, u32)]) -> Self {
        Self {
            sizes: sizes.to_vec(),
            cursor: 0,
            waits: 0,
            resized: Rc::new(Cell::new(false)),
        }
    }

    pub fn raise_resized(&mut self) {
        self.resized.set(true);
    }

    pub fn wait_count(&self) -> usize {
        self.waits
    }
}

impl FramebufferSource for ScriptedWindow {
    fn framebuffer_size(&self) -> (u32, u32) {
        self.sizes[self.cursor.min(self.sizes.len() - 1)]
    }

    fn wait_events(&mut self) {
        self.waits += 1;
        self.cursor += 1;
    }

    fn take_resized(&mut self) -> bool {
        self.resized.replace(false)
    }
}
