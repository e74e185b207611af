//! A backend without clients or a GPU. Every request the shell makes is
//! recorded so sessions can be replayed and inspected.

use std::collections::HashMap;

use smithay::{
    backend::input::ButtonState,
    input::keyboard::ModifiersState,
    utils::{Logical, Point, Size},
};

use crate::{
    backend::{Backend, SurfaceTexture},
    errors::Result,
    handlers::{AxisEvent, KeyEvent},
    render::{BoxInstance, TextureFormat, TextureId, UiRenderer},
    view::ViewId,
    ShellError,
};

#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    RequestSize(ViewId, Size<i32, Logical>),
    SetMaximized(ViewId, bool),
    SetFullscreen(ViewId, bool),
    SetActivated(ViewId, bool),
    SendClose(ViewId),
    KeyboardFocus(Option<ViewId>),
    ForwardKey(KeyEvent),
    ForwardModifiers(ModifiersState),
    PointerFocus(Option<(ViewId, Point<f64, Logical>)>),
    PointerButton(u32, ButtonState),
    PointerAxis(AxisEvent),
    Spawn(String),
    Quit,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    calls: Vec<BackendCall>,
    surfaces: HashMap<ViewId, SurfaceTexture>,
    /// Run spawned commands for real instead of only recording them.
    spawn_processes: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawning_processes(mut self) -> Self {
        self.spawn_processes = true;
        self
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn set_surface(&mut self, view: ViewId, surface: SurfaceTexture) {
        self.surfaces.insert(view, surface);
    }

    pub fn remove_surface(&mut self, view: ViewId) {
        self.surfaces.remove(&view);
    }

    /// The most recent size requested for `view`.
    pub fn last_requested_size(&self, view: ViewId) -> Option<Size<i32, Logical>> {
        self.calls.iter().rev().find_map(|call| match call {
            BackendCall::RequestSize(id, size) if *id == view => Some(*size),
            _ => None,
        })
    }

    pub fn close_requested(&self, view: ViewId) -> bool {
        self.calls
            .iter()
            .any(|call| *call == BackendCall::SendClose(view))
    }
}

impl Backend for HeadlessBackend {
    fn request_size(&mut self, view: ViewId, size: Size<i32, Logical>) {
        self.calls.push(BackendCall::RequestSize(view, size));
    }

    fn set_maximized(&mut self, view: ViewId, maximized: bool) {
        self.calls.push(BackendCall::SetMaximized(view, maximized));
    }

    fn set_fullscreen(&mut self, view: ViewId, fullscreen: bool) {
        self.calls.push(BackendCall::SetFullscreen(view, fullscreen));
    }

    fn set_activated(&mut self, view: ViewId, activated: bool) {
        self.calls.push(BackendCall::SetActivated(view, activated));
    }

    fn send_close(&mut self, view: ViewId) {
        self.calls.push(BackendCall::SendClose(view));
    }

    fn keyboard_focus(&mut self, view: Option<ViewId>) {
        self.calls.push(BackendCall::KeyboardFocus(view));
    }

    fn forward_key(&mut self, event: &KeyEvent) {
        self.calls.push(BackendCall::ForwardKey(event.clone()));
    }

    fn forward_modifiers(&mut self, modifiers: ModifiersState) {
        self.calls.push(BackendCall::ForwardModifiers(modifiers));
    }

    fn pointer_focus(&mut self, target: Option<(ViewId, Point<f64, Logical>)>, _time: u32) {
        self.calls.push(BackendCall::PointerFocus(target));
    }

    fn pointer_button(&mut self, button: u32, state: ButtonState, _time: u32) {
        self.calls.push(BackendCall::PointerButton(button, state));
    }

    fn pointer_axis(&mut self, event: &AxisEvent) {
        self.calls.push(BackendCall::PointerAxis(event.clone()));
    }

    fn surface_texture(&self, view: ViewId) -> Option<SurfaceTexture> {
        self.surfaces.get(&view).copied()
    }

    fn spawn(&mut self, command: &str) {
        self.calls.push(BackendCall::Spawn(command.to_owned()));
        if self.spawn_processes {
            super::spawn_command(command);
        }
    }

    fn quit(&mut self) {
        self.calls.push(BackendCall::Quit);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub texture: Option<TextureId>,
    pub instances: Vec<BoxInstance>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedTexture {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
}

/// Records draw calls instead of issuing them.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    textures: Vec<UploadedTexture>,
    draws: Vec<DrawCall>,
    /// Bytes that would have gone into instance buffers.
    uploaded_bytes: usize,
    fail_uploads: bool,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer whose texture uploads all fail, as on a driver that ran
    /// out of memory.
    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn textures(&self) -> &[UploadedTexture] {
        &self.textures
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn uploaded_bytes(&self) -> usize {
        self.uploaded_bytes
    }

    /// Forget the draws of previous frames; textures stay.
    pub fn clear_draws(&mut self) {
        self.draws.clear();
        self.uploaded_bytes = 0;
    }

    pub fn instances(&self) -> impl Iterator<Item = &BoxInstance> + '_ {
        self.draws.iter().flat_map(|draw| draw.instances.iter())
    }
}

impl UiRenderer for HeadlessRenderer {
    fn upload_texture(
        &mut self,
        format: TextureFormat,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureId> {
        if self.fail_uploads {
            return Err(ShellError::Render("texture uploads disabled".to_owned()));
        }
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if pixels.len() < expected {
            return Err(ShellError::Render(format!(
                "{width}x{height} {format:?} texture needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        self.textures.push(UploadedTexture {
            format,
            width,
            height,
        });
        Ok(TextureId(self.textures.len() as u64))
    }

    fn draw(&mut self, texture: Option<TextureId>, instances: &[BoxInstance]) {
        self.uploaded_bytes += bytemuck::cast_slice::<BoxInstance, u8>(instances).len();
        self.draws.push(DrawCall {
            texture,
            instances: instances.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_are_size_checked() {
        let mut renderer = HeadlessRenderer::new();
        assert_eq!(
            renderer
                .upload_texture(TextureFormat::Rgba8, 2, 2, &[0; 16])
                .ok(),
            Some(TextureId(1))
        );
        assert!(
            renderer
                .upload_texture(TextureFormat::Rgba8, 2, 2, &[0; 4])
                .is_err()
        );
        assert_eq!(renderer.textures().len(), 1);
    }

    #[test]
    fn last_requested_size_is_per_view() {
        let mut backend = HeadlessBackend::new();
        backend.request_size(ViewId::new(1), Size::from((10, 10)));
        backend.request_size(ViewId::new(2), Size::from((20, 20)));
        backend.request_size(ViewId::new(1), Size::from((30, 30)));
        assert_eq!(
            backend.last_requested_size(ViewId::new(1)),
            Some(Size::from((30, 30)))
        );
        assert_eq!(backend.last_requested_size(ViewId::new(3)), None);
    }
}
