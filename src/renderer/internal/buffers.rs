use std::marker::PhantomData;
use std::mem;
use std::num::NonZeroU64;

use bytemuck::Pod;

use crate::renderer::internal::GpuContext;
use crate::renderer::uniforms::ObjectData;

/// Uniform buffer holding one `T` per aligned slot, bound with a dynamic
/// offset. Slots are appended during a frame and uploaded in one write.
pub(crate) struct DynamicUniformSlots<T: Pod> {
    label: &'static str,
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
    pub(crate) bind_layout: wgpu::BindGroupLayout,
    stride: u32,
    capacity: u32,
    scratch: Vec<u8>,
    _marker: PhantomData<T>,
}

impl<T: Pod> DynamicUniformSlots<T> {
    pub(crate) fn new(
        context: &GpuContext,
        label: &'static str,
        visibility: wgpu::ShaderStages,
        capacity: u32,
    ) -> Self {
        let stride = aligned_stride(mem::size_of::<T>() as u32, context.uniform_alignment());
        let bind_layout =
            context
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(label),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: NonZeroU64::new(mem::size_of::<T>() as u64),
                        },
                        count: None,
                    }],
                });
        let capacity = capacity.max(1);
        let (buffer, bind_group) = Self::allocate(context, label, &bind_layout, stride, capacity);

        Self {
            label,
            buffer,
            bind_group,
            bind_layout,
            stride,
            capacity,
            scratch: Vec::with_capacity((stride * capacity) as usize),
            _marker: PhantomData,
        }
    }

    fn allocate(
        context: &GpuContext,
        label: &'static str,
        layout: &wgpu::BindGroupLayout,
        stride: u32,
        capacity: u32,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (stride as u64) * (capacity as u64),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buffer,
                        offset: 0,
                        size: NonZeroU64::new(mem::size_of::<T>() as u64),
                    }),
                }],
            });
        (buffer, bind_group)
    }

    pub(crate) fn begin_frame(&mut self) {
        self.scratch.clear();
    }

    /// Appends `value` and returns its dynamic offset.
    pub(crate) fn push(&mut self, value: &T) -> u32 {
        let offset = self.scratch.len() as u32;
        self.scratch.extend_from_slice(bytemuck::bytes_of(value));
        self.scratch.resize((offset + self.stride) as usize, 0);
        offset
    }

    pub(crate) fn flush(&mut self, context: &GpuContext) {
        let required = self.scratch.len() as u32 / self.stride;
        if required > self.capacity {
            let new_capacity = required.max(self.capacity * 2);
            log::info!(
                "Growing {}: {} -> {} slots",
                self.label,
                self.capacity,
                new_capacity
            );
            let (buffer, bind_group) =
                Self::allocate(context, self.label, &self.bind_layout, self.stride, new_capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = new_capacity;
        }

        if !self.scratch.is_empty() {
            context.queue.write_buffer(&self.buffer, 0, &self.scratch);
        }
    }
}

fn aligned_stride(size: u32, alignment: u32) -> u32 {
    size.div_ceil(alignment) * alignment
}

/// Per-draw model and normal matrices, indexed by instance id in shaders.
pub(crate) struct ObjectsBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) capacity: u32,
    pub(crate) bind_group: wgpu::BindGroup,
    pub(crate) bind_layout: wgpu::BindGroupLayout,
    scratch: Vec<ObjectData>,
}

impl ObjectsBuffer {
    pub(crate) fn new(context: &GpuContext, capacity: u32) -> Self {
        let bind_layout =
            context
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("ObjectsBindLayout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });
        let capacity = capacity.max(1);
        let (buffer, bind_group) = Self::allocate(context, &bind_layout, capacity);

        Self {
            buffer,
            capacity,
            bind_group,
            bind_layout,
            scratch: Vec::with_capacity(capacity as usize),
        }
    }

    fn allocate(
        context: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        capacity: u32,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ObjectsBuffer"),
            size: (capacity as usize * mem::size_of::<ObjectData>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("ObjectsBindGroup"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
        (buffer, bind_group)
    }

    pub(crate) fn begin_frame(&mut self) {
        self.scratch.clear();
    }

    /// Appends one instance and returns its index.
    pub(crate) fn push(&mut self, data: ObjectData) -> u32 {
        self.scratch.push(data);
        (self.scratch.len() - 1) as u32
    }

    pub(crate) fn flush(&mut self, context: &GpuContext) {
        let required = self.scratch.len() as u32;
        if required > self.capacity {
            let new_capacity = required.max(self.capacity * 2);
            log::info!(
                "Growing objects buffer: {} -> {}",
                self.capacity,
                new_capacity
            );
            let (buffer, bind_group) = Self::allocate(context, &self.bind_layout, new_capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = new_capacity;
        }

        if !self.scratch.is_empty() {
            context
                .queue
                .write_buffer(&self.buffer, 0, bytemuck::cast_slice(&self.scratch));
        }
    }
}
