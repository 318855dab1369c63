//! CNN Model Architecture for Refund Item Classification
//!
//! A compact convolutional network built with Burn. Four conv blocks halve
//! the spatial size each time, global average pooling makes the head
//! independent of the input resolution, and a two-layer classifier produces
//! one logit per class.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Configuration for the RefundClassifier CNN model
#[derive(Config, Debug)]
pub struct RefundClassifierConfig {
    /// Number of output classes (must equal the label count)
    pub num_classes: usize,

    /// Dropout rate used by the classifier head during training
    #[config(default = "0.3")]
    pub dropout_rate: f64,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Base number of convolutional filters
    #[config(default = "32")]
    pub base_filters: usize,

    /// Width of the hidden fully connected layer
    #[config(default = "256")]
    pub hidden_units: usize,
}

impl RefundClassifierConfig {
    /// Build the model on a device
    pub fn init<B: Backend>(&self, device: &B::Device) -> RefundClassifier<B> {
        RefundClassifier::new(self, device)
    }
}

/// A CNN block with Conv2d, BatchNorm, ReLU and MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B>,
    pub relu: Relu,
    pub pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    /// Create a new convolutional block
    pub fn new(in_channels: usize, out_channels: usize, kernel_size: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        let bn = BatchNormConfig::new(out_channels).init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    /// Forward pass through the block
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Refund Item Classifier CNN
///
/// Architecture:
/// - 4 convolutional blocks (conv, batch norm, ReLU, 2x2 max pool)
/// - Global Average Pooling
/// - Fully connected classifier with dropout
#[derive(Module, Debug)]
pub struct RefundClassifier<B: Backend> {
    pub conv1: ConvBlock<B>,
    pub conv2: ConvBlock<B>,
    pub conv3: ConvBlock<B>,
    pub conv4: ConvBlock<B>,

    pub global_pool: AdaptiveAvgPool2d,

    pub fc1: Linear<B>,
    pub dropout: Dropout,
    pub fc2: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> RefundClassifier<B> {
    /// Create a new RefundClassifier from configuration
    pub fn new(config: &RefundClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        // 224 -> 112 -> 56 -> 28 -> 14
        let conv1 = ConvBlock::new(config.in_channels, base, 3, device);
        let conv2 = ConvBlock::new(base, base * 2, 3, device);
        let conv3 = ConvBlock::new(base * 2, base * 4, 3, device);
        let conv4 = ConvBlock::new(base * 4, base * 8, 3, device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        let fc1 = LinearConfig::new(base * 8, config.hidden_units).init(device);
        let dropout = DropoutConfig::new(config.dropout_rate).init();
        let fc2 = LinearConfig::new(config.hidden_units, config.num_classes).init(device);

        Self {
            conv1,
            conv2,
            conv3,
            conv4,
            global_pool,
            fc1,
            dropout,
            fc2,
            num_classes: config.num_classes,
        }
    }

    /// Forward pass through the network
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = Relu::new().forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn small_config(num_classes: usize) -> RefundClassifierConfig {
        RefundClassifierConfig::new(num_classes)
            .with_base_filters(4)
            .with_hidden_units(16)
    }

    #[test]
    fn test_refund_classifier_output_shape() {
        let device = Default::default();
        let model = small_config(5).init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 224, 224], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 5]);
        assert_eq!(model.num_classes(), 5);
    }

    #[test]
    fn test_head_is_resolution_independent() {
        let device = Default::default();
        let model = small_config(3).init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 64, 96], &device);
        assert_eq!(model.forward(input).dims(), [1, 3]);
    }

    #[test]
    fn test_config_defaults() {
        let config = RefundClassifierConfig::new(10);
        assert_eq!(config.num_classes, 10);
        assert_eq!(config.in_channels, 3);
        assert_eq!(config.base_filters, 32);
        assert_eq!(config.hidden_units, 256);
    }
}
