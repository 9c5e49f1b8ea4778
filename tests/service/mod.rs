mod access;
mod allocator;
mod lifecycle;
