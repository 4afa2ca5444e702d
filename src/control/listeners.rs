use std::rc::Rc;

pub type ListenerId = u64;

/// Ordered callback registry.
///
/// Callers take a `snapshot` while the owning state is borrowed and invoke
/// it after the borrow is released, so callbacks may re-enter the owner.
pub(crate) struct Listeners<A: ?Sized> {
    entries: Vec<(ListenerId, Rc<dyn Fn(&A)>)>,
}

impl<A: ?Sized> Listeners<A> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, id: ListenerId, listener: Rc<dyn Fn(&A)>) {
        self.entries.push((id, listener));
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        before != self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn snapshot(&self) -> Vec<Rc<dyn Fn(&A)>> {
        self.entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }
}

pub(crate) fn notify<A: ?Sized>(listeners: Vec<Rc<dyn Fn(&A)>>, payload: &A) {
    for listener in listeners {
        listener(payload);
    }
}
