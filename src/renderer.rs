// renderer.rs — skybox cube renderer (triangle strips) with an egui overlay

use crate::geometry::{CubeFace, FaceMap};
use crate::mesh::{SkyVertex, SkyboxMesh, Subdivision};
use crate::projection::ProjectionMode;
use crate::texture::{validate_image, TextureBackend, TextureBindings, TextureError};
use crate::viewer::SkyboxViewer;
use image::RgbaImage;
use std::ops::Range;
use wgpu::util::DeviceExt;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter found")]
    NoAdapter,

    #[error("failed to open graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

fn setup_egui_ui_fonts(ctx: &egui::Context) {
    // Prefer a system font with wide script coverage so translated string
    // tables render; egui's bundled font covers Latin only.
    fn try_load_font_from_path(path: &std::path::Path) -> Option<Vec<u8>> {
        let bytes = std::fs::read(path).ok()?;
        ab_glyph::FontArc::try_from_vec(bytes.clone()).ok()?;
        Some(bytes)
    }

    let mut candidates: Vec<std::path::PathBuf> = Vec::new();
    if cfg!(windows) {
        let win_fonts = std::path::PathBuf::from(r"C:\Windows\Fonts");
        for f in ["segoeui.ttf", "msyh.ttf", "meiryo.ttf", "malgun.ttf", "arial.ttf"] {
            candidates.push(win_fonts.join(f));
        }
    } else if cfg!(target_os = "macos") {
        candidates.push("/System/Library/Fonts/Supplemental/Arial Unicode.ttf".into());
        candidates.push("/System/Library/Fonts/Supplemental/Arial.ttf".into());
    } else if cfg!(unix) {
        candidates.push("/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf".into());
        candidates.push("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".into());
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join("assets").join("NotoSans-Regular.ttf"));
        }
    }
    candidates.push(std::path::PathBuf::from("assets").join("NotoSans-Regular.ttf"));

    let Some((font_path, font_bytes)) = candidates
        .into_iter()
        .find_map(|p| try_load_font_from_path(&p).map(|bytes| (p, bytes)))
    else {
        log::info!("no UI font found, using egui defaults");
        return;
    };
    log::info!("using UI font {}", font_path.display());

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("ui".to_owned(), egui::FontData::from_owned(font_bytes));
    if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Proportional) {
        family.push("ui".to_owned());
    }
    ctx.set_fonts(fonts);
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
}

/// A face texture and the bind group that samples it.
pub struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Uploads images into textures sampled through one sampler.
pub struct GpuUploader<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    layout: &'a wgpu::BindGroupLayout,
    sampler: &'a wgpu::Sampler,
}

impl GpuUploader<'_> {
    fn create(&self, img: &RgbaImage, label: &str) -> GpuTexture {
        let (width, height) = img.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            label: Some(label),
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            img,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(self.sampler),
                },
            ],
            label: Some(label),
        });

        GpuTexture { texture, bind_group }
    }
}

impl TextureBackend for GpuUploader<'_> {
    type Handle = GpuTexture;

    fn upload(&mut self, img: &RgbaImage) -> Result<GpuTexture, TextureError> {
        validate_image(img)?;

        // Images beyond the device limit are scaled down to fit
        let max = self.device.limits().max_texture_dimension_2d;
        let (src_w, src_h) = img.dimensions();
        let mut pixels = if src_w > max || src_h > max {
            let scale = max as f32 / src_w.max(src_h) as f32;
            let new_w = ((src_w as f32 * scale) as u32).clamp(1, max);
            let new_h = ((src_h as f32 * scale) as u32).clamp(1, max);
            log::warn!("image {src_w}x{src_h} exceeds GPU limit {max}, scaled to {new_w}x{new_h}");
            image::imageops::resize(img, new_w, new_h, image::imageops::FilterType::Lanczos3)
        } else {
            img.clone()
        };

        // bottom row first, so v = 0 samples the bottom of the image
        image::imageops::flip_vertical_in_place(&mut pixels);

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let uploaded = self.create(&pixels, "skybox_face_texture");
        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());

        match validation.or(oom) {
            None => Ok(uploaded),
            Some(e) => {
                uploaded.texture.destroy();
                Err(TextureError::Upload(e.to_string()))
            }
        }
    }

    fn release(&mut self, handle: GpuTexture) {
        handle.texture.destroy();
    }
}

struct MeshBuffers {
    key: (ProjectionMode, Subdivision),
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    ranges: FaceMap<Range<u32>>,
    triangles: usize,
}

impl MeshBuffers {
    fn build(device: &wgpu::Device, mode: ProjectionMode, subdivision: Subdivision) -> Self {
        let mesh = SkyboxMesh::build(mode, subdivision);
        let merged = mesh.merged();
        log::debug!(
            "built {mode:?} skybox mesh: {} vertices, {} triangles",
            merged.vertices.len(),
            mesh.triangle_count()
        );

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Vertex Buffer"),
            contents: bytemuck::cast_slice(&merged.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Index Buffer"),
            contents: bytemuck::cast_slice(&merged.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            key: (mode, subdivision),
            vertex_buffer,
            index_buffer,
            ranges: merged.ranges,
            triangles: mesh.triangle_count(),
        }
    }
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,

    // Textures
    texture_bind_group_layout: wgpu::BindGroupLayout,
    face_sampler: wgpu::Sampler,
    panorama_sampler: wgpu::Sampler,
    blank: GpuTexture,
    textures: TextureBindings<GpuTexture>,

    // Camera
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    mesh: MeshBuffers,
    projection: ProjectionMode,

    // UI
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        label: Some("depth_texture"),
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

impl Renderer {
    pub async fn new(window: std::sync::Arc<Window>, viewer: &SkyboxViewer) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window.as_ref()) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: if cfg!(target_arch = "wasm32") {
                        wgpu::Limits::downlevel_webgl2_defaults()
                    } else {
                        wgpu::Limits::default().using_resolution(adapter.limits())
                    },
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, config.width, config.height);

        // --- 1. Textures ---
        let texture_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("texture_bind_group_layout"),
        });

        let face_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let panorama_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat, // panoramas wrap horizontally
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // untextured faces sample the clear color
        let blank = GpuUploader {
            device: &device,
            queue: &queue,
            layout: &texture_bind_group_layout,
            sampler: &face_sampler,
        }
        .create(&RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255])), "blank_texture");

        // --- 2. Camera ---
        let camera_uniform = CameraUniform {
            view_proj: viewer.view_projection(config.width as f32 / config.height as f32).to_cols_array_2d(),
        };
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        // --- 3. Pipeline ---
        let shader = device.create_shader_module(wgpu::include_wgsl!("skybox.wgsl"));
        let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Skybox Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SkyVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &ATTRIBUTES,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: Some(wgpu::IndexFormat::Uint32),
                front_face: wgpu::FrontFace::Ccw,
                // the camera sits inside the cube and sees the inner faces
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let mesh = MeshBuffers::build(&device, viewer.projection, viewer.subdivision);

        // --- 4. Egui ---
        let egui_ctx = egui::Context::default();
        setup_egui_ui_fonts(&egui_ctx);

        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);

        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            depth_view,
            texture_bind_group_layout,
            face_sampler,
            panorama_sampler,
            blank,
            textures: TextureBindings::new(),
            camera_buffer,
            camera_bind_group,
            mesh,
            projection: viewer.projection,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);
        }
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangles
    }

    /// Pushes the viewer's camera and rebuilds the mesh if its projection
    /// mode or subdivision changed.
    pub fn update_viewer(&mut self, viewer: &SkyboxViewer) {
        let camera_uniform = CameraUniform {
            view_proj: viewer.view_projection(self.aspect()).to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));

        self.projection = viewer.projection;
        if self.mesh.key != (viewer.projection, viewer.subdivision) {
            self.mesh = MeshBuffers::build(&self.device, viewer.projection, viewer.subdivision);
        }
    }

    pub fn bind_face(&mut self, face: CubeFace, img: &RgbaImage) -> Result<(), TextureError> {
        let mut uploader = GpuUploader {
            device: &self.device,
            queue: &self.queue,
            layout: &self.texture_bind_group_layout,
            sampler: &self.face_sampler,
        };
        self.textures.rebind(&mut uploader, face, img)
    }

    pub fn bind_panorama(&mut self, img: &RgbaImage) -> Result<(), TextureError> {
        let mut uploader = GpuUploader {
            device: &self.device,
            queue: &self.queue,
            layout: &self.texture_bind_group_layout,
            sampler: &self.panorama_sampler,
        };
        self.textures.rebind_panorama(&mut uploader, img)
    }

    pub fn clear_face(&mut self, face: CubeFace) {
        let mut uploader = GpuUploader {
            device: &self.device,
            queue: &self.queue,
            layout: &self.texture_bind_group_layout,
            sampler: &self.face_sampler,
        };
        self.textures.clear_face(&mut uploader, face);
    }

    pub fn clear_panorama(&mut self) {
        let mut uploader = GpuUploader {
            device: &self.device,
            queue: &self.queue,
            layout: &self.texture_bind_group_layout,
            sampler: &self.panorama_sampler,
        };
        self.textures.clear_panorama(&mut uploader);
    }

    pub fn clear_textures(&mut self) {
        let mut uploader = GpuUploader {
            device: &self.device,
            queue: &self.queue,
            layout: &self.texture_bind_group_layout,
            sampler: &self.face_sampler,
        };
        self.textures.release_all(&mut uploader);
    }

    /// Spherical mode wraps the panorama over every face; a face without
    /// one falls back to its own image, then to the blank texture.
    fn face_bind_group(&self, face: CubeFace) -> &wgpu::BindGroup {
        let bound = match self.projection {
            ProjectionMode::Spherical => self.textures.panorama().or_else(|| self.textures.handle(face)),
            ProjectionMode::Flat => self.textures.handle(face),
        };
        &bound.unwrap_or(&self.blank).bind_group
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        // 1. Skybox
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Skybox Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: false,
                    }),
                    stencil_ops: None,
                }),
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            for face in CubeFace::ALL {
                render_pass.set_bind_group(1, self.face_bind_group(face), &[]);
                render_pass.draw_indexed(self.mesh.ranges[face].clone(), 0, 0..1);
            }
        }

        // 2. UI
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.clear_textures();
    }
}
