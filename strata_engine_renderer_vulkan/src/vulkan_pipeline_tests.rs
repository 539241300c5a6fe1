//! Unit tests for vulkan_pipeline.rs
//!
//! Vertex input layout only; pipeline creation needs a GPU.

use ash::vk;
use super::*;

#[test]
fn test_vertex_binding_matches_vertex_stride() {
    let [binding] = vertex_bindings();
    assert_eq!(binding.binding, 0);
    assert_eq!(binding.stride, 36);
    assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);
}

#[test]
fn test_vertex_attributes_are_three_vec3() {
    let attributes = vertex_attributes();
    let offsets: Vec<u32> = attributes.iter().map(|a| a.offset).collect();
    let locations: Vec<u32> = attributes.iter().map(|a| a.location).collect();

    assert_eq!(offsets, vec![0, 12, 24]);
    assert_eq!(locations, vec![0, 1, 2]);
    assert!(attributes.iter().all(|a| a.format == vk::Format::R32G32B32_SFLOAT && a.binding == 0));
}
