//! SDF-based WebGPU render pipeline
//!
//! Renders the entire scene in fragment shader using signed distance fields.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::consts::MAX_BALLS;
use crate::settings::Settings;
use crate::sim::{BallColor, GameState};

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2], // offset 0
    arena_size: [f32; 2], // offset 8
    time: f32,            // offset 16
    ball_count: u32,      // offset 20
    _pad: [u32; 2],       // pad to 32 bytes
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PaddleData {
    rect: [f32; 4], // x, y, w, h (arena pixels)
    immune: u32,    // 1 while damage immunity is active
    health: u32,
    _pad: [u32; 2], // uniform array stride must be 16-aligned
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BallData {
    center: [f32; 2],
    radius: f32,
    damaging: u32,
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

/// Every GPU object the game draws with; owned by the top-level game loop
pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    // Uniform buffers (no storage buffers, so WebGL2 works too)
    globals_buffer: wgpu::Buffer,
    paddles_buffer: wgpu::Buffer,
    balls_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    start_time: f64,
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        settings: &Settings,
    ) -> Self {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await
            .expect("Failed to create device");

        let surface_caps = surface.get_capabilities(adapter);
        log::debug!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals {
                resolution: [width as f32, height as f32],
                arena_size: [settings.width as f32, settings.height as f32],
                time: 0.0,
                ball_count: 0,
                _pad: [0; 2],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let paddles_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("paddles"),
            size: (std::mem::size_of::<PaddleData>() * 2) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let balls_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("balls"),
            size: (std::mem::size_of::<BallData>() * MAX_BALLS) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[uniform_entry(0), uniform_entry(1), uniform_entry(2)],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: paddles_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: balls_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::info!("SDF pipeline ready ({}x{})", width, height);

        Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            paddles_buffer,
            balls_buffer,
            bind_group,
            size: (width, height),
            start_time: 0.0,
        }
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Update GPU buffers from the match (if any) and render
    ///
    /// With no match the empty arena is drawn behind the menu.
    pub fn render(
        &mut self,
        state: Option<&GameState>,
        settings: &Settings,
        time: f64,
    ) -> Result<(), wgpu::SurfaceError> {
        // time is ms from requestAnimationFrame, convert to seconds since start
        let elapsed = ((time - self.start_time) / 1000.0) as f32;

        let (paddles, balls) = match state {
            Some(state) => (paddle_data(state), ball_data(state)),
            None => (
                [PaddleData::zeroed(); 2],
                vec![BallData::zeroed(); MAX_BALLS],
            ),
        };
        let ball_count = state.map_or(0, |s| s.balls.len().min(MAX_BALLS)) as u32;

        let globals = Globals {
            resolution: [self.size.0 as f32, self.size.1 as f32],
            arena_size: [settings.width as f32, settings.height as f32],
            time: elapsed,
            ball_count,
            _pad: [0; 2],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
        self.queue
            .write_buffer(&self.paddles_buffer, 0, bytemuck::cast_slice(&paddles));
        self.queue
            .write_buffer(&self.balls_buffer, 0, bytemuck::cast_slice(&balls));

        // Render
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Surface size in physical pixels for a canvas laid out at `css_width` x `css_height`
pub fn backing_size(css_width: i32, css_height: i32, device_pixel_ratio: f64) -> (u32, u32) {
    let scale = |css: i32| (css.max(0) as f64 * device_pixel_ratio).round() as u32;
    (scale(css_width), scale(css_height))
}

fn paddle_data(state: &GameState) -> [PaddleData; 2] {
    state.paddles.clone().map(|paddle| PaddleData {
        rect: [
            paddle.rect.pos.x as f32,
            paddle.rect.pos.y as f32,
            paddle.rect.size.x as f32,
            paddle.rect.size.y as f32,
        ],
        immune: paddle.is_immune() as u32,
        health: paddle.health as u32,
        _pad: [0; 2],
    })
}

fn ball_data(state: &GameState) -> Vec<BallData> {
    let mut data = vec![BallData::zeroed(); MAX_BALLS];
    for (slot, ball) in data.iter_mut().zip(&state.balls) {
        let center = ball.rect.pos.as_vec2() + ball.rect.size.as_vec2() / 2.0;
        *slot = BallData {
            center: center.to_array(),
            radius: ball.rect.size.x as f32 / 2.0,
            damaging: (ball.color == BallColor::Damaging) as u32,
        };
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_struct_sizes() {
        // Uniform layout rules: 16-byte multiples
        assert_eq!(std::mem::size_of::<Globals>(), 32);
        assert_eq!(std::mem::size_of::<PaddleData>(), 32);
        assert_eq!(std::mem::size_of::<BallData>(), 16);
    }

    #[test]
    fn test_backing_size_follows_layout() {
        assert_eq!(backing_size(800, 600, 1.0), (800, 600));
        assert_eq!(backing_size(1280, 720, 2.0), (2560, 1440));
        assert_eq!(backing_size(333, 333, 1.5), (500, 500));
        // Hidden canvas: zero size, which resize ignores
        assert_eq!(backing_size(0, -4, 2.0), (0, 0));
    }

    #[test]
    fn test_ball_data_packing() {
        let settings = Settings::default();
        let state = GameState::new(3, &settings);
        let data = ball_data(&state);
        assert_eq!(data.len(), MAX_BALLS);
        assert_eq!(data[0].radius, 10.0);
        assert_eq!(data[0].damaging, 1);
        assert_eq!(data[MAX_BALLS - 1].radius, 0.0);

        let paddles = paddle_data(&state);
        assert_eq!(paddles[1].rect, [750.0, 250.0, 20.0, 100.0]);
        assert_eq!(paddles[0].health, 3);
    }
}
