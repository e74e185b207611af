use smithay::utils::{Logical, Size};

use crate::{
    backend::Backend,
    geometry::{fullscreen_area, usable_area},
    handlers::OutputHandler,
    state::Shell,
    view::{ViewId, ViewState},
};

impl<B: Backend> OutputHandler for Shell<B> {
    fn output_resized(&mut self, size: Size<i32, Logical>) {
        if size == self.output_size {
            return;
        }
        tracing::info!(width = size.w, height = size.h, "output resized");
        self.output_size = size;

        let relayout: Vec<(ViewId, ViewState)> = self
            .views_mru()
            .filter(|view| matches!(view.state, ViewState::Maximized | ViewState::Fullscreen))
            .map(|view| (view.id, view.state))
            .collect();

        for (id, state) in relayout {
            let area = if state == ViewState::Fullscreen {
                fullscreen_area(size)
            } else {
                usable_area(size)
            };
            self.place(id, area);
        }
    }
}
