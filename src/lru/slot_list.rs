/// Sentinel index marking the end of the list in either direction.
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    prev: usize,
    next: usize,
}

/// Doubly linked list whose nodes live in a `Vec` and link to each other by index.
///
/// Indices returned by [SlotList::push_front] stay valid until the item is removed. Freed slots
/// are recycled by later pushes, so an index must not be used after its item has been removed.
#[derive(Debug)]
pub(crate) struct SlotList<T> {
    head: usize,
    tail: usize,
    len: usize,
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> SlotList<T> {
    pub(crate) fn with_capacity(capacity: usize) -> SlotList<T> {
        SlotList {
            head: NIL,
            tail: NIL,
            len: 0,
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(|slot| slot.value.as_mut())
    }

    /// Index of the item at the back of the list, the least recently pushed or moved one.
    pub(crate) fn back(&self) -> Option<usize> {
        (self.tail != NIL).then_some(self.tail)
    }

    /// Adds an item to the front of the list and returns its index.
    pub(crate) fn push_front(&mut self, value: T) -> usize {
        let slot = Slot {
            value: Some(value),
            prev: NIL,
            next: NIL,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = slot;
                index
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };

        self.link_front(index);
        self.len += 1;
        index
    }

    /// Moves an occupied slot to the front of the list. Vacant or unknown indices are ignored.
    pub(crate) fn move_to_front(&mut self, index: usize) {
        if self.get(index).is_none() || self.head == index {
            return;
        }

        self.unlink(index);
        self.link_front(index);
    }

    /// Removes the item at `index` and frees its slot for reuse.
    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        let value = self.slots.get_mut(index)?.value.take()?;

        self.unlink(index);
        self.free.push(index);
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn pop_back(&mut self) -> Option<T> {
        let index = self.back()?;
        self.remove(index)
    }

    /// Iterates from the front to the back of the list.
    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.head = NIL;
        self.tail = NIL;
        self.len = 0;
        self.slots.clear();
        self.free.clear();
    }

    fn link_front(&mut self, index: usize) {
        //          head            tail
        //           |               |
        // [index] <-> [a] <-> ... <-> [z]
        self.slots[index].prev = NIL;
        self.slots[index].next = self.head;

        if self.head != NIL {
            self.slots[self.head].prev = index;
        } else {
            self.tail = index;
        }

        self.head = index;
    }

    fn unlink(&mut self, index: usize) {
        let prev = self.slots[index].prev;
        let next = self.slots[index].next;

        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.slots[index].prev = NIL;
        self.slots[index].next = NIL;
    }
}

pub(crate) struct Iter<'a, T> {
    list: &'a SlotList<T>,
    cursor: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }

        let slot = &self.list.slots[self.cursor];
        self.cursor = slot.next;
        slot.value.as_ref()
    }
}
