//! Per-frame draw recording
//!
//! Draws are collected on the CPU while the frame is open and uploaded once at
//! `end_frame`. Every draw owns a distinct uniform slot and vertex range, so no
//! queued buffer write is ever overwritten by a later draw in the same frame.

use std::rc::Rc;

use lumen_core::Color;

use crate::scissor::Scissor;
use crate::tessellate::Mesh;
use crate::uniforms::{DrawUniforms, Vertex, UNIFORM_SIZE, UNIFORM_STRIDE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Geometry {
    /// Four strip vertices starting at `first_vertex`
    Quad { first_vertex: u32 },
    Mesh {
        base_vertex: i32,
        first_index: u32,
        index_count: u32,
    },
}

pub struct Draw {
    /// Index of the uniform block, multiplied by the stride for the dynamic offset
    pub slot: u32,
    pub bind_group: Rc<wgpu::BindGroup>,
    pub scissor: Scissor,
    pub geometry: Geometry,
}

impl Draw {
    pub fn uniform_offset(&self) -> u32 {
        self.slot * UNIFORM_STRIDE as u32
    }
}

#[derive(Default)]
pub struct DrawList {
    /// Load op for the pass; `None` keeps the target contents
    pub clear: Option<Color>,
    pub uniforms: Vec<DrawUniforms>,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub draws: Vec<Draw>,
}

impl DrawList {
    pub fn reset(&mut self) {
        self.clear = None;
        self.uniforms.clear();
        self.vertices.clear();
        self.indices.clear();
        self.draws.clear();
    }

    /// Restart the pass with a clear. Earlier draws would be overwritten and are dropped.
    pub fn clear(&mut self, color: Color) {
        self.reset();
        self.clear = Some(color);
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    fn next_slot(&mut self, uniforms: DrawUniforms) -> u32 {
        let slot = self.uniforms.len() as u32;
        self.uniforms.push(uniforms);
        slot
    }

    pub fn push_quad(
        &mut self,
        uniforms: DrawUniforms,
        vertices: [Vertex; 4],
        bind_group: Rc<wgpu::BindGroup>,
        scissor: Scissor,
    ) {
        let slot = self.next_slot(uniforms);
        let first_vertex = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&vertices);
        self.draws.push(Draw {
            slot,
            bind_group,
            scissor,
            geometry: Geometry::Quad { first_vertex },
        });
    }

    pub fn push_mesh(
        &mut self,
        uniforms: DrawUniforms,
        mesh: &Mesh,
        bind_group: Rc<wgpu::BindGroup>,
        scissor: Scissor,
    ) {
        if mesh.is_empty() {
            return;
        }
        let slot = self.next_slot(uniforms);
        let base_vertex = self.vertices.len() as i32;
        let first_index = self.indices.len() as u32;
        self.vertices.extend_from_slice(&mesh.vertices);
        self.indices.extend_from_slice(&mesh.indices);
        self.draws.push(Draw {
            slot,
            bind_group,
            scissor,
            geometry: Geometry::Mesh {
                base_vertex,
                first_index,
                index_count: mesh.indices.len() as u32,
            },
        });
    }

    /// Uniform blocks laid out at [`UNIFORM_STRIDE`]
    pub fn uniform_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.uniforms.len() * UNIFORM_STRIDE as usize];
        for (slot, block) in self.uniforms.iter().enumerate() {
            let start = slot * UNIFORM_STRIDE as usize;
            bytes[start..start + UNIFORM_SIZE as usize].copy_from_slice(bytemuck::bytes_of(block));
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::{quad, Sampling};
    use lumen_core::{Mat3, Rect};

    fn block(opacity: f32) -> DrawUniforms {
        DrawUniforms::new(
            &Mat3::IDENTITY,
            [10.0, 10.0, 1.0, 0.0],
            &Rect::new(0.0, 0.0, 1.0, 1.0),
            Color::RED,
            Sampling::None,
            opacity,
            0.0,
        )
    }

    #[test]
    fn test_uniform_slots_do_not_alias() {
        let mut list = DrawList::default();
        list.uniforms.push(block(0.25));
        list.uniforms.push(block(0.75));
        let bytes = list.uniform_bytes();
        assert_eq!(bytes.len(), 512);

        let first: DrawUniforms = bytemuck::pod_read_unaligned(&bytes[..128]);
        let second: DrawUniforms = bytemuck::pod_read_unaligned(&bytes[256..384]);
        assert_eq!(first.params[1], 0.25);
        assert_eq!(second.params[1], 0.75);
    }

    #[test]
    fn test_clear_drops_earlier_geometry() {
        let mut list = DrawList::default();
        list.uniforms.push(block(1.0));
        list.vertices
            .extend_from_slice(&quad(&Rect::new(0.0, 0.0, 1.0, 1.0), [0.0, 0.0, 1.0, 1.0]));
        list.clear(Color::WHITE);
        assert!(list.uniforms.is_empty());
        assert!(list.vertices.is_empty());
        assert_eq!(list.clear, Some(Color::WHITE));
    }
}
