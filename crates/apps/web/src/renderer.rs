//! wgpu renderer for the map's draw lists.
//!
//! Only built for wasm32. Other targets get a stub whose `new` returns
//! `RenderError::Unsupported`.

use foundation::math::Mat4;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer init failed: {0}")]
    Init(String),
    #[error("surface unavailable: {0}")]
    Surface(String),
    #[error("wgpu rendering is only available on wasm32 targets")]
    Unsupported,
}

/// Per-frame camera inputs shared by every pass.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub struct FrameGlobals {
    pub view_proj: Mat4,
    pub camera_right: [f32; 3],
    pub camera_up: [f32; 3],
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use std::borrow::Cow;
    use std::collections::HashMap;

    use layers::labels::LabelBitmap;
    use scene::components::{LabelTextureId, MeshKind};
    use scene::render::{DrawInstance, DrawList};

    use super::{FrameGlobals, RenderError};
    use crate::shaders::{LABEL_SHADER, MESH_SHADER};

    const DEPTH_FORMAT: ::wgpu::TextureFormat = ::wgpu::TextureFormat::Depth24Plus;
    const CLEAR: ::wgpu::Color = ::wgpu::Color {
        r: 0.006,
        g: 0.010,
        b: 0.022,
        a: 1.0,
    };
    const LIGHT_DIR: [f32; 4] = [0.35, 0.8, 0.45, 0.0];

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct MeshVertex {
        position: [f32; 3],
        normal: [f32; 3],
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct LabelVertex {
        corner: [f32; 2],
        uv: [f32; 2],
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct InstanceRaw {
        model: [[f32; 4]; 4],
        color: [f32; 4],
        params: [f32; 4],
    }

    impl From<&DrawInstance> for InstanceRaw {
        fn from(d: &DrawInstance) -> Self {
            Self {
                model: d.model,
                color: d.color,
                params: d.params,
            }
        }
    }

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Globals {
        view_proj: [[f32; 4]; 4],
        camera_right: [f32; 4],
        camera_up: [f32; 4],
        light_dir: [f32; 4],
    }

    const INSTANCE_STRIDE: u64 = std::mem::size_of::<InstanceRaw>() as u64;
    const MESH_ATTRS: [::wgpu::VertexAttribute; 2] =
        ::wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
    const LABEL_ATTRS: [::wgpu::VertexAttribute; 2] =
        ::wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];
    const INSTANCE_ATTRS: [::wgpu::VertexAttribute; 6] = ::wgpu::vertex_attr_array![
        2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4,
        6 => Float32x4, 7 => Float32x4
    ];

    fn mesh_layout() -> ::wgpu::VertexBufferLayout<'static> {
        ::wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as ::wgpu::BufferAddress,
            step_mode: ::wgpu::VertexStepMode::Vertex,
            attributes: &MESH_ATTRS,
        }
    }

    fn label_layout() -> ::wgpu::VertexBufferLayout<'static> {
        ::wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LabelVertex>() as ::wgpu::BufferAddress,
            step_mode: ::wgpu::VertexStepMode::Vertex,
            attributes: &LABEL_ATTRS,
        }
    }

    fn instance_layout() -> ::wgpu::VertexBufferLayout<'static> {
        ::wgpu::VertexBufferLayout {
            array_stride: INSTANCE_STRIDE,
            step_mode: ::wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRS,
        }
    }

    struct MeshBuffers {
        vertex: ::wgpu::Buffer,
        index: Option<(::wgpu::Buffer, u32)>,
        vertex_count: u32,
    }

    impl MeshBuffers {
        fn new(device: &::wgpu::Device, name: &str, vertices: &[MeshVertex], indices: &[u16]) -> Self {
            let vertex = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some(name),
                contents: bytemuck::cast_slice(vertices),
                usage: ::wgpu::BufferUsages::VERTEX,
            });
            let index = (!indices.is_empty()).then(|| {
                let buf = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                    label: Some(name),
                    contents: bytemuck::cast_slice(indices),
                    usage: ::wgpu::BufferUsages::INDEX,
                });
                (buf, indices.len() as u32)
            });
            Self {
                vertex,
                index,
                vertex_count: vertices.len() as u32,
            }
        }

        fn draw(&self, rpass: &mut ::wgpu::RenderPass<'_>) {
            rpass.set_vertex_buffer(0, self.vertex.slice(..));
            match &self.index {
                Some((buf, count)) => {
                    rpass.set_index_buffer(buf.slice(..), ::wgpu::IndexFormat::Uint16);
                    rpass.draw_indexed(0..*count, 0, 0..1);
                }
                None => rpass.draw(0..self.vertex_count, 0..1),
            }
        }

        fn destroy(&self) {
            self.vertex.destroy();
            if let Some((buf, _)) = &self.index {
                buf.destroy();
            }
        }
    }

    struct LabelTexture {
        texture: ::wgpu::Texture,
        bind_group: ::wgpu::BindGroup,
    }

    struct PipelineSpec<'a> {
        label: &'a str,
        layout: &'a ::wgpu::PipelineLayout,
        module: &'a ::wgpu::ShaderModule,
        vs: &'a str,
        fs: &'a str,
        buffers: &'a [::wgpu::VertexBufferLayout<'a>],
        topology: ::wgpu::PrimitiveTopology,
        blend: ::wgpu::BlendState,
        depth_write: bool,
        depth_compare: ::wgpu::CompareFunction,
    }

    fn build_pipeline(
        device: &::wgpu::Device,
        format: ::wgpu::TextureFormat,
        spec: PipelineSpec<'_>,
    ) -> ::wgpu::RenderPipeline {
        device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some(spec.label),
            layout: Some(spec.layout),
            vertex: ::wgpu::VertexState {
                module: spec.module,
                entry_point: Some(spec.vs),
                compilation_options: Default::default(),
                buffers: spec.buffers,
            },
            fragment: Some(::wgpu::FragmentState {
                module: spec.module,
                entry_point: Some(spec.fs),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format,
                    blend: Some(spec.blend),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: spec.topology,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                // Rings and labels are seen from both sides.
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(::wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: spec.depth_write,
                depth_compare: spec.depth_compare,
                stencil: ::wgpu::StencilState::default(),
                bias: ::wgpu::DepthBiasState::default(),
            }),
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn create_depth(
        device: &::wgpu::Device,
        config: &::wgpu::SurfaceConfiguration,
    ) -> (::wgpu::Texture, ::wgpu::TextureView) {
        let tex = device.create_texture(&::wgpu::TextureDescriptor {
            label: Some("poimap-depth"),
            size: ::wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: ::wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = tex.create_view(&::wgpu::TextureViewDescriptor::default());
        (tex, view)
    }

    fn octahedron_mesh() -> Vec<MeshVertex> {
        let px = [1.0, 0.0, 0.0];
        let nx = [-1.0, 0.0, 0.0];
        let py = [0.0, 1.0, 0.0];
        let ny = [0.0, -1.0, 0.0];
        let pz = [0.0, 0.0, 1.0];
        let nz = [0.0, 0.0, -1.0];
        let faces = [
            [px, py, pz],
            [pz, py, nx],
            [nx, py, nz],
            [nz, py, px],
            [pz, ny, px],
            [nx, ny, pz],
            [nz, ny, nx],
            [px, ny, nz],
        ];
        let mut out = Vec::with_capacity(24);
        for [a, b, c] in faces {
            let n = [
                (a[0] + b[0] + c[0]) / 3.0,
                (a[1] + b[1] + c[1]) / 3.0,
                (a[2] + b[2] + c[2]) / 3.0,
            ];
            for p in [a, b, c] {
                out.push(MeshVertex {
                    position: p,
                    normal: n,
                });
            }
        }
        out
    }

    fn sphere_mesh(lat_segments: u32, lon_segments: u32) -> (Vec<MeshVertex>, Vec<u16>) {
        let mut vertices = Vec::with_capacity(((lat_segments + 1) * (lon_segments + 1)) as usize);
        for lat in 0..=lat_segments {
            let theta = lat as f32 / lat_segments as f32 * std::f32::consts::PI;
            for lon in 0..=lon_segments {
                let phi = lon as f32 / lon_segments as f32 * std::f32::consts::TAU;
                let p = [theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
                vertices.push(MeshVertex {
                    position: p,
                    normal: p,
                });
            }
        }
        let stride = lon_segments + 1;
        let mut indices = Vec::with_capacity((lat_segments * lon_segments * 6) as usize);
        for lat in 0..lat_segments {
            for lon in 0..lon_segments {
                let i0 = lat * stride + lon;
                let i1 = i0 + 1;
                let i2 = i0 + stride;
                let i3 = i2 + 1;
                indices.extend([i0, i2, i1, i1, i2, i3].map(|i| i as u16));
            }
        }
        (vertices, indices)
    }

    /// Unit annulus; `position.z` marks the rim (0 inner, 1 outer).
    fn ring_mesh(segments: u32) -> (Vec<MeshVertex>, Vec<u16>) {
        let mut vertices = Vec::with_capacity((segments * 2) as usize);
        for i in 0..segments {
            let a = i as f32 / segments as f32 * std::f32::consts::TAU;
            for rim in [0.0, 1.0] {
                vertices.push(MeshVertex {
                    position: [a.cos(), a.sin(), rim],
                    normal: [0.0, 0.0, 1.0],
                });
            }
        }
        let mut indices = Vec::with_capacity((segments * 6) as usize);
        for i in 0..segments {
            let inner = i * 2;
            let outer = inner + 1;
            let next_inner = ((i + 1) % segments) * 2;
            let next_outer = next_inner + 1;
            indices.extend([inner, outer, next_inner, next_inner, outer, next_outer].map(|i| i as u16));
        }
        (vertices, indices)
    }

    /// Three orthogonal great circles as a line list.
    fn wire_sphere_mesh(segments: u32) -> Vec<MeshVertex> {
        let point = |axis: usize, a: f32| -> [f32; 3] {
            let (s, c) = a.sin_cos();
            match axis {
                0 => [c, s, 0.0],
                1 => [c, 0.0, s],
                _ => [0.0, c, s],
            }
        };
        let mut out = Vec::with_capacity((segments * 6) as usize);
        for axis in 0..3 {
            for i in 0..segments {
                let a0 = i as f32 / segments as f32 * std::f32::consts::TAU;
                let a1 = (i + 1) as f32 / segments as f32 * std::f32::consts::TAU;
                for p in [point(axis, a0), point(axis, a1)] {
                    out.push(MeshVertex {
                        position: p,
                        normal: p,
                    });
                }
            }
        }
        out
    }

    fn label_quad() -> [LabelVertex; 6] {
        let v = |x: f32, y: f32| LabelVertex {
            corner: [x, y],
            uv: [x + 0.5, 0.5 - y],
        };
        [
            v(-0.5, -0.5),
            v(0.5, -0.5),
            v(0.5, 0.5),
            v(-0.5, -0.5),
            v(0.5, 0.5),
            v(-0.5, 0.5),
        ]
    }

    pub struct Renderer {
        surface: ::wgpu::Surface<'static>,
        _instance: ::wgpu::Instance,
        device: ::wgpu::Device,
        queue: ::wgpu::Queue,
        config: ::wgpu::SurfaceConfiguration,
        opaque_pipeline: ::wgpu::RenderPipeline,
        translucent_pipeline: ::wgpu::RenderPipeline,
        ring_pipeline: ::wgpu::RenderPipeline,
        line_pipeline: ::wgpu::RenderPipeline,
        label_pipeline: ::wgpu::RenderPipeline,
        globals_buffer: ::wgpu::Buffer,
        globals_bind_group: ::wgpu::BindGroup,
        label_bgl: ::wgpu::BindGroupLayout,
        label_sampler: ::wgpu::Sampler,
        depth: (::wgpu::Texture, ::wgpu::TextureView),
        meshes: HashMap<MeshKind, MeshBuffers>,
        label_quad: ::wgpu::Buffer,
        instances: ::wgpu::Buffer,
        instance_capacity: u64,
        labels: HashMap<LabelTextureId, LabelTexture>,
    }

    impl Renderer {
        pub async fn new(canvas: web_sys::HtmlCanvasElement) -> Result<Self, RenderError> {
            let width = canvas.width().max(1);
            let height = canvas.height().max(1);

            let instance = ::wgpu::Instance::new(&::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            });
            let surface = instance
                .create_surface(::wgpu::SurfaceTarget::Canvas(canvas))
                .map_err(|e| RenderError::Init(format!("surface: {e}")))?;
            let adapter = instance
                .request_adapter(&::wgpu::RequestAdapterOptions {
                    power_preference: ::wgpu::PowerPreference::HighPerformance,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .map_err(|e| RenderError::Init(format!("adapter: {e}")))?;
            let (device, queue) = adapter
                .request_device(&::wgpu::DeviceDescriptor {
                    label: Some("poimap-device"),
                    required_features: ::wgpu::Features::empty(),
                    required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                    ..Default::default()
                })
                .await
                .map_err(|e| RenderError::Init(format!("device: {e}")))?;

            let caps = surface.get_capabilities(&adapter);
            let format = caps
                .formats
                .iter()
                .copied()
                .find(|f| f.is_srgb())
                .or_else(|| caps.formats.first().copied())
                .ok_or_else(|| RenderError::Init("surface reports no formats".into()))?;
            let alpha_mode = caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(::wgpu::CompositeAlphaMode::Auto);
            let config = ::wgpu::SurfaceConfiguration {
                usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width,
                height,
                desired_maximum_frame_latency: 2,
                present_mode: ::wgpu::PresentMode::Fifo,
                alpha_mode,
                view_formats: vec![],
            };
            surface.configure(&device, &config);
            let depth = create_depth(&device, &config);

            let mesh_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
                label: Some("poimap-mesh-shader"),
                source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(MESH_SHADER)),
            });
            let label_shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
                label: Some("poimap-label-shader"),
                source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(LABEL_SHADER)),
            });

            let globals_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
                label: Some("poimap-globals"),
                size: std::mem::size_of::<Globals>() as u64,
                usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let globals_bgl = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("poimap-globals-bgl"),
                entries: &[::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: ::wgpu::BindingType::Buffer {
                        ty: ::wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });
            let globals_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
                label: Some("poimap-globals-bg"),
                layout: &globals_bgl,
                entries: &[::wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                }],
            });

            let label_bgl = device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("poimap-label-bgl"),
                entries: &[
                    ::wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: ::wgpu::ShaderStages::FRAGMENT,
                        ty: ::wgpu::BindingType::Texture {
                            sample_type: ::wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: ::wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    ::wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: ::wgpu::ShaderStages::FRAGMENT,
                        ty: ::wgpu::BindingType::Sampler(::wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });
            let label_sampler = device.create_sampler(&::wgpu::SamplerDescriptor {
                label: Some("poimap-label-sampler"),
                mag_filter: ::wgpu::FilterMode::Linear,
                min_filter: ::wgpu::FilterMode::Linear,
                ..Default::default()
            });

            let mesh_layout_desc = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                label: Some("poimap-mesh-pipeline-layout"),
                bind_group_layouts: &[&globals_bgl],
                immediate_size: 0,
            });
            let label_layout_desc = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
                label: Some("poimap-label-pipeline-layout"),
                bind_group_layouts: &[&globals_bgl, &label_bgl],
                immediate_size: 0,
            });

            let mesh_buffers = [mesh_layout(), instance_layout()];
            let label_buffers = [label_layout(), instance_layout()];
            use ::wgpu::{BlendState, CompareFunction, PrimitiveTopology};
            let mesh_spec = |label: &'static str,
                             vs: &'static str,
                             fs: &'static str,
                             topology: PrimitiveTopology,
                             blend: BlendState,
                             depth_write: bool,
                             depth_compare: CompareFunction| PipelineSpec {
                label,
                layout: &mesh_layout_desc,
                module: &mesh_shader,
                vs,
                fs,
                buffers: &mesh_buffers,
                topology,
                blend,
                depth_write,
                depth_compare,
            };
            let opaque_pipeline = build_pipeline(
                &device,
                format,
                mesh_spec(
                    "poimap-opaque",
                    "vs_mesh",
                    "fs_lit",
                    PrimitiveTopology::TriangleList,
                    BlendState::REPLACE,
                    true,
                    CompareFunction::Less,
                ),
            );
            let translucent_pipeline = build_pipeline(
                &device,
                format,
                mesh_spec(
                    "poimap-translucent",
                    "vs_mesh",
                    "fs_lit",
                    PrimitiveTopology::TriangleList,
                    BlendState::ALPHA_BLENDING,
                    false,
                    CompareFunction::Less,
                ),
            );
            let ring_pipeline = build_pipeline(
                &device,
                format,
                mesh_spec(
                    "poimap-ring",
                    "vs_ring",
                    "fs_flat",
                    PrimitiveTopology::TriangleList,
                    BlendState::ALPHA_BLENDING,
                    false,
                    CompareFunction::LessEqual,
                ),
            );
            let line_pipeline = build_pipeline(
                &device,
                format,
                mesh_spec(
                    "poimap-lines",
                    "vs_mesh",
                    "fs_flat",
                    PrimitiveTopology::LineList,
                    BlendState::ALPHA_BLENDING,
                    false,
                    CompareFunction::LessEqual,
                ),
            );
            let label_pipeline = build_pipeline(
                &device,
                format,
                PipelineSpec {
                    label: "poimap-labels",
                    layout: &label_layout_desc,
                    module: &label_shader,
                    vs: "vs_label",
                    fs: "fs_label",
                    buffers: &label_buffers,
                    topology: PrimitiveTopology::TriangleList,
                    blend: BlendState::ALPHA_BLENDING,
                    depth_write: false,
                    depth_compare: CompareFunction::LessEqual,
                },
            );

            let mut meshes = HashMap::new();
            meshes.insert(
                MeshKind::Octahedron,
                MeshBuffers::new(&device, "poimap-octahedron", &octahedron_mesh(), &[]),
            );
            let (sv, si) = sphere_mesh(16, 32);
            meshes.insert(MeshKind::Sphere, MeshBuffers::new(&device, "poimap-sphere", &sv, &si));
            let (rv, ri) = ring_mesh(64);
            meshes.insert(MeshKind::Ring, MeshBuffers::new(&device, "poimap-ring", &rv, &ri));
            meshes.insert(
                MeshKind::WireSphere,
                MeshBuffers::new(&device, "poimap-wire-sphere", &wire_sphere_mesh(96), &[]),
            );
            let label_quad = device.create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some("poimap-label-quad"),
                contents: bytemuck::cast_slice(&label_quad()),
                usage: ::wgpu::BufferUsages::VERTEX,
            });

            let instance_capacity = 64;
            let instances = create_instance_buffer(&device, instance_capacity);

            tracing::info!(width, height, format = ?format, "renderer ready");
            Ok(Self {
                surface,
                _instance: instance,
                device,
                queue,
                config,
                opaque_pipeline,
                translucent_pipeline,
                ring_pipeline,
                line_pipeline,
                label_pipeline,
                globals_buffer,
                globals_bind_group,
                label_bgl,
                label_sampler,
                depth,
                meshes,
                label_quad,
                instances,
                instance_capacity,
                labels: HashMap::new(),
            })
        }

        pub fn resize(&mut self, width: u32, height: u32) {
            if width == 0 || height == 0 {
                return;
            }
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth.0.destroy();
            self.depth = create_depth(&self.device, &self.config);
        }

        pub fn upload_label(&mut self, id: LabelTextureId, bitmap: &LabelBitmap) {
            self.release_label(id);
            let size = ::wgpu::Extent3d {
                width: bitmap.width,
                height: bitmap.height,
                depth_or_array_layers: 1,
            };
            let texture = self.device.create_texture(&::wgpu::TextureDescriptor {
                label: Some("poimap-label"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: ::wgpu::TextureDimension::D2,
                format: ::wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: ::wgpu::TextureUsages::TEXTURE_BINDING | ::wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            self.queue.write_texture(
                ::wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: ::wgpu::Origin3d::ZERO,
                    aspect: ::wgpu::TextureAspect::All,
                },
                &bitmap.rgba,
                ::wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * bitmap.width),
                    rows_per_image: Some(bitmap.height),
                },
                size,
            );
            let view = texture.create_view(&::wgpu::TextureViewDescriptor::default());
            let bind_group = self.device.create_bind_group(&::wgpu::BindGroupDescriptor {
                label: Some("poimap-label-bg"),
                layout: &self.label_bgl,
                entries: &[
                    ::wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ::wgpu::BindingResource::TextureView(&view),
                    },
                    ::wgpu::BindGroupEntry {
                        binding: 1,
                        resource: ::wgpu::BindingResource::Sampler(&self.label_sampler),
                    },
                ],
            });
            self.labels.insert(id, LabelTexture { texture, bind_group });
        }

        pub fn release_label(&mut self, id: LabelTextureId) {
            if let Some(old) = self.labels.remove(&id) {
                old.texture.destroy();
            }
        }

        fn ensure_instance_capacity(&mut self, count: u64) {
            if count <= self.instance_capacity {
                return;
            }
            let capacity = count.next_power_of_two();
            self.instances.destroy();
            self.instances = create_instance_buffer(&self.device, capacity);
            self.instance_capacity = capacity;
        }

        pub fn render(&mut self, list: &DrawList, frame: FrameGlobals) -> Result<(), RenderError> {
            let ordered: Vec<&DrawInstance> = list
                .opaque
                .iter()
                .chain(&list.translucent)
                .chain(&list.lines)
                .chain(&list.labels)
                .collect();
            let raw: Vec<InstanceRaw> = ordered.iter().map(|d| InstanceRaw::from(*d)).collect();
            self.ensure_instance_capacity(raw.len() as u64);
            if !raw.is_empty() {
                self.queue
                    .write_buffer(&self.instances, 0, bytemuck::cast_slice(&raw));
            }

            let [rx, ry, rz] = frame.camera_right;
            let [ux, uy, uz] = frame.camera_up;
            let globals = Globals {
                view_proj: frame.view_proj,
                camera_right: [rx, ry, rz, 0.0],
                camera_up: [ux, uy, uz, 0.0],
                light_dir: LIGHT_DIR,
            };
            self.queue
                .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

            let output = match self.surface.get_current_texture() {
                Ok(t) => t,
                Err(e) => {
                    // Lost or outdated surfaces recover on the next frame.
                    self.surface.configure(&self.device, &self.config);
                    return Err(RenderError::Surface(e.to_string()));
                }
            };
            let view = output
                .texture
                .create_view(&::wgpu::TextureViewDescriptor::default());
            let mut encoder = self
                .device
                .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                    label: Some("poimap-frame"),
                });

            {
                let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                    label: Some("poimap-scene-pass"),
                    color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: ::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(CLEAR),
                            store: ::wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(::wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth.1,
                        depth_ops: Some(::wgpu::Operations {
                            load: ::wgpu::LoadOp::Clear(1.0),
                            store: ::wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                    multiview_mask: None,
                });
                rpass.set_bind_group(0, &self.globals_bind_group, &[]);

                for (slot, item) in ordered.iter().enumerate() {
                    let offset = slot as u64 * INSTANCE_STRIDE;
                    rpass.set_vertex_buffer(1, self.instances.slice(offset..offset + INSTANCE_STRIDE));

                    if item.kind == MeshKind::Label {
                        let Some(tex) = item.texture.and_then(|t| self.labels.get(&t)) else {
                            continue;
                        };
                        rpass.set_pipeline(&self.label_pipeline);
                        rpass.set_bind_group(1, &tex.bind_group, &[]);
                        rpass.set_vertex_buffer(0, self.label_quad.slice(..));
                        rpass.draw(0..6, 0..1);
                        continue;
                    }

                    let pipeline = if slot < list.opaque.len() {
                        &self.opaque_pipeline
                    } else {
                        match item.kind {
                            MeshKind::Ring => &self.ring_pipeline,
                            MeshKind::WireSphere => &self.line_pipeline,
                            _ => &self.translucent_pipeline,
                        }
                    };
                    let Some(mesh) = self.meshes.get(&item.kind) else {
                        continue;
                    };
                    rpass.set_pipeline(pipeline);
                    mesh.draw(&mut rpass);
                }
            }

            self.queue.submit(std::iter::once(encoder.finish()));
            output.present();
            Ok(())
        }

        /// Free every GPU resource, then let go of the surface.
        pub fn dispose(mut self) {
            for (_, label) in self.labels.drain() {
                label.texture.destroy();
            }
            for mesh in self.meshes.values() {
                mesh.destroy();
            }
            self.label_quad.destroy();
            self.instances.destroy();
            self.globals_buffer.destroy();
            self.depth.0.destroy();
            let Renderer {
                surface,
                _instance: instance,
                ..
            } = self;
            drop(surface);
            drop(instance);
            tracing::debug!("renderer disposed");
        }
    }

    fn create_instance_buffer(device: &::wgpu::Device, capacity: u64) -> ::wgpu::Buffer {
        device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("poimap-instances"),
            size: capacity * INSTANCE_STRIDE,
            usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use layers::labels::LabelBitmap;
    use scene::components::LabelTextureId;
    use scene::render::DrawList;

    use super::{FrameGlobals, RenderError};

    #[derive(Debug, Default)]
    pub struct Renderer;

    impl Renderer {
        pub async fn new(_canvas: web_sys::HtmlCanvasElement) -> Result<Self, RenderError> {
            Err(RenderError::Unsupported)
        }

        pub fn resize(&mut self, _width: u32, _height: u32) {}

        pub fn upload_label(&mut self, _id: LabelTextureId, _bitmap: &LabelBitmap) {}

        pub fn release_label(&mut self, _id: LabelTextureId) {}

        pub fn render(&mut self, _list: &DrawList, _frame: FrameGlobals) -> Result<(), RenderError> {
            Err(RenderError::Unsupported)
        }

        pub fn dispose(self) {}
    }
}

pub use imp::Renderer;
