/// Keys the lightbox reacts to while it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Escape,
}

impl Key {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            "Escape" => Some(Key::Escape),
            _ => None,
        }
    }
}

/// Side effects the lightbox needs from whatever is hosting it.
pub trait LightboxHost {
    fn suppress_scroll(&mut self);
    fn restore_scroll(&mut self);
    fn bind_keys(&mut self);
    fn unbind_keys(&mut self);
}

/// Host for renderers that have no page to lock, such as the server.
#[derive(Debug, Default)]
pub struct DetachedHost;

impl LightboxHost for DetachedHost {
    fn suppress_scroll(&mut self) {}
    fn restore_scroll(&mut self) {}
    fn bind_keys(&mut self) {}
    fn unbind_keys(&mut self) {}
}

/// Full screen viewer over the visible window of a gallery.
///
/// Indices refer to the visible window, whose length is passed in on every
/// navigation so an extension while open is picked up immediately. Scroll
/// suppression and key bindings follow the open/closed transition, never the
/// number of calls, so they are undone exactly once.
#[derive(Debug, Default)]
pub struct Lightbox {
    selected: Option<usize>,
    loading: bool,
}

impl Lightbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn open(&mut self, index: usize, visible_len: usize, host: &mut impl LightboxHost) -> bool {
        if index >= visible_len {
            return false;
        }
        if self.selected.is_none() {
            host.suppress_scroll();
            host.bind_keys();
        }
        self.select(index);
        true
    }

    pub fn close(&mut self, host: &mut impl LightboxHost) {
        if self.selected.take().is_some() {
            host.unbind_keys();
            host.restore_scroll();
        }
        self.loading = false;
    }

    pub fn next(&mut self, visible_len: usize) -> Option<usize> {
        let current = self.selected?;
        let target = next_index(current, visible_len)?;
        self.select(target);
        Some(target)
    }

    pub fn prev(&mut self, visible_len: usize) -> Option<usize> {
        let current = self.selected?;
        let target = prev_index(current, visible_len)?;
        self.select(target);
        Some(target)
    }

    /// The selected media finished loading.
    pub fn media_loaded(&mut self) {
        self.loading = false;
    }

    /// The selected media failed to load. Clears the spinner just like
    /// success does.
    pub fn media_failed(&mut self) {
        self.loading = false;
    }

    /// Shifts the selection after an item was inserted in front of it so it
    /// keeps pointing at the same media.
    pub fn shift_for_prepend(&mut self) {
        if let Some(index) = self.selected.as_mut() {
            *index += 1;
        }
    }

    pub fn handle_key(
        &mut self,
        key: Key,
        visible_len: usize,
        host: &mut impl LightboxHost,
    ) -> bool {
        if !self.is_open() {
            return false;
        }
        match key {
            Key::Left => self.prev(visible_len).is_some(),
            Key::Right => self.next(visible_len).is_some(),
            Key::Escape => {
                self.close(host);
                true
            }
        }
    }

    fn select(&mut self, index: usize) {
        self.selected = Some(index);
        self.loading = true;
    }
}

pub fn next_index(current: usize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some((current % len + 1) % len)
}

pub fn prev_index(current: usize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some((current % len + len - 1) % len)
}
