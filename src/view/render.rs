use tracing::info;
use wgpu::util::DeviceExt;
use wgpu::*;

use super::gpu_init::GpuContext;
use super::mesh::{self, MeshBuffer, Vertex};
use super::texture::{GpuTexture, TextureImage, TextureKind};
use crate::controller::{clear_color, EntityShading, InputController, ModelUniform, SceneUniform};
use crate::model::{DirectionalLight, Scene, Transform};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

/// Camera and light uniform shared by every draw.
pub struct SceneResources {
    pub scene_buffer: Buffer,
    pub bind_group_layout: BindGroupLayout,
    pub bind_group: BindGroup,
}

pub fn create_scene_resources(device: &Device) -> SceneResources {
    let scene_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("scene_buffer"),
        size: std::mem::size_of::<SceneUniform>() as BufferAddress,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("scene_bind_group_layout"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX_FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("scene_bind_group"),
        layout: &bind_group_layout,
        entries: &[BindGroupEntry { binding: 0, resource: scene_buffer.as_entire_binding() }],
    });

    SceneResources { scene_buffer, bind_group_layout, bind_group }
}

/// Model uniform, base texture and normal map (each with a sampler) for one entity.
pub fn create_entity_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("entity_bind_group_layout"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 2,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 3,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 4,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub fn create_entity_pipeline(
    device: &Device,
    format: TextureFormat,
    scene_layout: &BindGroupLayout,
    entity_layout: &BindGroupLayout,
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("entity_shader"),
        source: ShaderSource::Wgsl(include_str!("../shaders/entity.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("entity_pipeline_layout"),
        bind_group_layouts: &[scene_layout, entity_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("entity_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            // Scanned models have inconsistent winding
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// Images a model is drawn with.
pub struct EntityTextures<'a> {
    pub base: &'a TextureImage,
    pub normal_map: &'a TextureImage,
}

/// A mesh, its textures and its model uniform on the GPU.
pub struct GpuEntity {
    pub name: String,
    pub mesh: MeshBuffer,
    pub texture: GpuTexture,
    pub normal_map: GpuTexture,
    pub uniform_buffer: Buffer,
    pub bind_group: BindGroup,
    pub shading: EntityShading,
}

impl GpuEntity {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &Device,
        queue: &Queue,
        layout: &BindGroupLayout,
        name: &str,
        mesh: &mesh::Mesh,
        textures: EntityTextures<'_>,
        transform: &Transform,
        shading: EntityShading,
    ) -> Self {
        let mesh = mesh.upload(device);
        let texture = GpuTexture::upload(device, queue, textures.base, TextureKind::Color, name);
        let normal_map = GpuTexture::upload(device, queue, textures.normal_map, TextureKind::NormalMap, name);
        let uniform = ModelUniform::new(transform, shading);
        let uniform_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some(name),
            contents: bytemuck::bytes_of(&uniform),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some(name),
            layout,
            entries: &[
                BindGroupEntry { binding: 0, resource: uniform_buffer.as_entire_binding() },
                BindGroupEntry { binding: 1, resource: BindingResource::TextureView(&texture.view) },
                BindGroupEntry { binding: 2, resource: BindingResource::Sampler(&texture.sampler) },
                BindGroupEntry { binding: 3, resource: BindingResource::TextureView(&normal_map.view) },
                BindGroupEntry { binding: 4, resource: BindingResource::Sampler(&normal_map.sampler) },
            ],
        });

        Self {
            name: name.to_string(),
            mesh,
            texture,
            normal_map,
            uniform_buffer,
            bind_group,
            shading,
        }
    }

    pub fn update(&self, queue: &Queue, transform: &Transform) {
        let uniform = ModelUniform::new(transform, self.shading);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }
}

impl Drop for GpuEntity {
    fn drop(&mut self) {
        self.uniform_buffer.destroy();
    }
}

/// Tessellated egui output for one frame.
pub struct UiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// Pipelines and every GPU resource the viewer draws with.
pub struct Renderer {
    depth_texture: Texture,
    depth_view: TextureView,
    scene: SceneResources,
    pipeline: RenderPipeline,
    player: GpuEntity,
    scenery: Vec<GpuEntity>,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    /// Load every model in the scene and build the pipeline.
    pub fn new(gpu: &GpuContext, scene: &Scene) -> Self {
        let device = gpu.device.as_ref();
        let queue = gpu.queue.as_ref();
        let (depth_texture, depth_view) = create_depth_texture(device, gpu.config.width, gpu.config.height);
        let scene_resources = create_scene_resources(device);
        let entity_layout = create_entity_layout(device);
        let pipeline = create_entity_pipeline(device, gpu.format, &scene_resources.bind_group_layout, &entity_layout);

        let spawn = &scene.player;
        let player = GpuEntity::new(
            device,
            queue,
            &entity_layout,
            "player",
            &mesh::load_or_fallback(&spawn.mesh),
            EntityTextures {
                base: &TextureImage::load_or_fallback(&spawn.texture),
                normal_map: &TextureImage::normal_map_or_flat(Some(&spawn.normal_map)),
            },
            &spawn.transform,
            EntityShading::PLAYER,
        );

        // Scenery has no normal maps; one flat texel keeps the bind group uniform
        let flat_normal = TextureImage::normal_map_or_flat(None);
        let scenery = scene
            .scenery
            .iter()
            .map(|entry| {
                GpuEntity::new(
                    device,
                    queue,
                    &entity_layout,
                    entry.name,
                    &mesh::load_or_fallback(&entry.mesh),
                    EntityTextures {
                        base: &TextureImage::load_or_fallback(&entry.texture),
                        normal_map: &flat_normal,
                    },
                    &entry.transform,
                    EntityShading::SCENERY,
                )
            })
            .collect::<Vec<_>>();
        info!(models = scenery.len() + 1, "Scene uploaded");

        let egui_renderer = egui_wgpu::Renderer::new(device, gpu.format, egui_wgpu::RendererOptions::default());

        Self {
            depth_texture,
            depth_view,
            scene: scene_resources,
            pipeline,
            player,
            scenery,
            egui_renderer,
        }
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        self.depth_texture.destroy();
        let (depth_texture, depth_view) = create_depth_texture(device, width, height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    /// Upload this frame's uniforms, draw the scene then the HUD on top.
    pub fn draw_frame(
        &mut self,
        gpu: &GpuContext,
        controller: &InputController,
        sun: &DirectionalLight,
        ui: UiFrame,
    ) -> Result<(), SurfaceError> {
        let device = gpu.device.as_ref();
        let queue = gpu.queue.as_ref();

        let scene_uniform = SceneUniform::from_controller(controller, sun);
        queue.write_buffer(&self.scene.scene_buffer, 0, bytemuck::bytes_of(&scene_uniform));
        self.player.update(queue, controller.player().transform());

        let frame = gpu.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor { label: Some("encoder") });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(clear_color(controller.night_vision())),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations { load: LoadOp::Clear(1.0), store: StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &self.scene.bind_group, &[]);

            for entity in std::iter::once(&self.player).chain(self.scenery.iter()) {
                if entity.mesh.index_count == 0 {
                    continue;
                }
                rp.set_bind_group(1, &entity.bind_group, &[]);
                rp.set_vertex_buffer(0, entity.mesh.vertex_buffer.slice(..));
                rp.set_index_buffer(entity.mesh.index_buffer.slice(..), IndexFormat::Uint32);
                rp.draw_indexed(0..entity.mesh.index_count, 0, 0..1);
            }
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: ui.pixels_per_point,
        };

        for (id, image_delta) in &ui.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer
            .update_buffers(device, queue, &mut encoder, &ui.primitives, &screen_descriptor);

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Load, store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &ui.primitives, &screen_descriptor);
        }

        for id in &ui.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.depth_texture.destroy();
    }
}
