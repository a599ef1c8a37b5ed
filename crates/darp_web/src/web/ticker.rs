//! Display-refresh tick source backed by `requestAnimationFrame`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use darp::scheduler::TickSource;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Calls `on_frame` once per display refresh while subscribed.
///
/// The pending request id doubles as the subscription flag: a callback that
/// fires after `unsubscribe` finds no id and stops without rescheduling.
pub(super) struct AnimationFrameTicks {
    pending: Rc<Cell<Option<i32>>>,
    callback: FrameCallback,
}

fn request(callback: &FrameCallback) -> Option<i32> {
    let window = web_sys::window()?;
    let slot = callback.borrow();
    let f = slot.as_ref()?;
    window.request_animation_frame(f.as_ref().unchecked_ref()).ok()
}

impl AnimationFrameTicks {
    pub(super) fn new(mut on_frame: impl FnMut() + 'static) -> Self {
        let pending: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
        let callback: FrameCallback = Rc::new(RefCell::new(None));

        let p = Rc::clone(&pending);
        let cb = Rc::clone(&callback);
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |_timestamp: f64| {
            if p.take().is_none() {
                return;
            }
            on_frame();
            p.set(request(&cb));
        }) as Box<dyn FnMut(f64)>));

        Self { pending, callback }
    }
}

impl TickSource for AnimationFrameTicks {
    fn subscribe(&mut self) {
        if self.pending.get().is_none() {
            self.pending.set(request(&self.callback));
        }
    }

    fn unsubscribe(&mut self) {
        if let Some(id) = self.pending.take() {
            if let Some(w) = web_sys::window() {
                let _ = w.cancel_animation_frame(id);
            }
        }
    }

    fn is_subscribed(&self) -> bool {
        self.pending.get().is_some()
    }
}
