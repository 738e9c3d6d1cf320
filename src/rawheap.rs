use std::mem;
use std::ptr;
use std::marker;
use std::alloc;


const INITIAL_CAPACITY: usize = 32;
const MAX_ZST_CAPACITY: usize = 1 << (usize::BITS - 1);

pub(crate) struct RawHeap<T> {
    pub ptr: ptr::NonNull<T>,
    pub cap: usize,
    _marker: marker::PhantomData<T>,
}

unsafe impl<T: Send> Send for RawHeap<T> {}
unsafe impl<T: Sync> Sync for RawHeap<T> {}

impl<T> RawHeap<T> {
    pub fn new() -> Self {
        let cap = match mem::size_of::<T>() {
            0 => MAX_ZST_CAPACITY,
            _ => 0,
        };

        RawHeap {
            ptr: ptr::NonNull::dangling(),
            cap,
            _marker: marker::PhantomData,
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        let mut raw = Self::new();
        if cap > 0 && mem::size_of::<T>() != 0 {
            raw.grow_to(cap);
        }
        raw
    }

    pub fn grow(&mut self) {
        let new_cap = match self.cap {
            0 => INITIAL_CAPACITY,
            cap => 3 * cap,
        };
        self.grow_to(new_cap);
    }

    pub fn grow_to(&mut self, new_cap: usize) {
        if new_cap <= self.cap {
            return;
        }
        assert_ne!(mem::size_of::<T>(), 0, "Capacity Overflow");

        let new_layout = alloc::Layout::array::<T>(new_cap).unwrap();
        assert!(
            new_layout.size() <= MAX_ZST_CAPACITY, "Allocation is too large"
        );
        let new_ptr = match self.cap {
            0 => unsafe { alloc::alloc(new_layout) },
            _ => {
                let old_layout = alloc::Layout::array::<T>(self.cap)
                                    .unwrap();
                let old_ptr = self.ptr.as_ptr() as *mut u8;
                unsafe {
                    alloc::realloc(old_ptr, old_layout, new_layout.size())
                }
            }
        };

        self.ptr = match ptr::NonNull::new(new_ptr as *mut T) {
            Some(p) => p,
            None => alloc::handle_alloc_error(new_layout),
        };
        self.cap = new_cap;
    }
}

impl<T> Drop for RawHeap<T> {
    fn drop(&mut self) {
        let elem_size = mem::size_of::<T>();
        if self.cap != 0 && elem_size != 0 {
            unsafe {
                alloc::dealloc(
                    self.ptr.as_ptr() as *mut u8,
                    alloc::Layout::array::<T>(self.cap).unwrap(),
                )
            }
        }
    }
}
